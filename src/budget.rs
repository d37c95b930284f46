//! Resource budgets for parsing.
//!
//! A [`BudgetEnforcer`] inspects the event stream as the parser produces it and stops
//! pathological inputs (alias floods, document separator storms, runaway nesting) before
//! a consumer has to materialize them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKind};
use crate::{Error, Parser, ParserOptions, ScalarStyle};

/// Limits for a streaming parse.
///
/// The defaults are permissive for typical configuration files while stopping obvious
/// resource-amplifying inputs.
///
/// ```rust
/// use yaml_events::{budget, parse_str_with_options, parser_options, Error};
///
/// let options = parser_options! {
///     budget: Some(budget! { max_documents: 1 }),
/// };
/// let err = parse_str_with_options("a\n---\nb\n", options).unwrap_err();
/// assert!(matches!(err.without_snippet(), Error::Budget { .. }));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum total parser events (counting every event, comments included).
    ///
    /// Default: 1,000,000
    pub max_events: usize,
    /// Maximum number of alias (`*ref`) events.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximum number of anchor definitions (`&anchor`).
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum structural nesting depth (sequences + mappings).
    ///
    /// Default: 2,000
    pub max_depth: usize,
    /// Maximum number of documents in the stream.
    ///
    /// Default: 1,024
    pub max_documents: usize,
    /// Maximum number of nodes (SequenceStart/MappingStart/Scalar).
    ///
    /// Default: 250,000
    pub max_nodes: usize,
    /// Maximum total bytes of scalar contents.
    ///
    /// Default: 67,108,864 (64 MiB)
    pub max_total_scalar_bytes: usize,
    /// Maximum number of merge keys (`<<`).
    ///
    /// Default: 10,000
    pub max_merge_keys: usize,
    /// If `true`, flag inputs that use far more aliases than anchors.
    ///
    /// Default: true
    pub enforce_alias_anchor_ratio: bool,
    /// Minimum number of aliases before the ratio heuristic applies.
    ///
    /// Default: 100
    pub alias_anchor_min_aliases: usize,
    /// A breach occurs when `aliases > alias_anchor_ratio_multiplier * anchors`.
    ///
    /// Default: 10
    pub alias_anchor_ratio_multiplier: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_events: 1_000_000,
            max_aliases: 50_000,
            max_anchors: 50_000,
            max_depth: 2_000,
            max_documents: 1_024,
            max_nodes: 250_000,
            max_total_scalar_bytes: 64 * 1024 * 1024,
            max_merge_keys: 10_000,
            enforce_alias_anchor_ratio: true,
            alias_anchor_min_aliases: 100,
            alias_anchor_ratio_multiplier: 10,
        }
    }
}

/// Which limit tripped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    Events { events: usize },
    Aliases { aliases: usize },
    Anchors { anchors: usize },
    /// Depth counts nested `SequenceStart` and `MappingStart` events.
    Depth { depth: usize },
    Documents { documents: usize },
    /// Nodes are `SequenceStart`, `MappingStart` and `Scalar` events.
    Nodes { nodes: usize },
    ScalarBytes { total_scalar_bytes: usize },
    MergeKeys { merge_keys: usize },
    /// Checked once the stream is complete.
    AliasAnchorRatio { aliases: usize, anchors: usize },
    /// A closing event without a matching opening one.
    Unbalanced,
}

impl fmt::Display for BudgetBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetBreach::Events { events } => write!(f, "too many events ({events})"),
            BudgetBreach::Aliases { aliases } => write!(f, "too many aliases ({aliases})"),
            BudgetBreach::Anchors { anchors } => write!(f, "too many anchors ({anchors})"),
            BudgetBreach::Depth { depth } => write!(f, "nesting too deep ({depth})"),
            BudgetBreach::Documents { documents } => {
                write!(f, "too many documents ({documents})")
            }
            BudgetBreach::Nodes { nodes } => write!(f, "too many nodes ({nodes})"),
            BudgetBreach::ScalarBytes { total_scalar_bytes } => {
                write!(f, "scalar content too large ({total_scalar_bytes} bytes)")
            }
            BudgetBreach::MergeKeys { merge_keys } => {
                write!(f, "too many merge keys ({merge_keys})")
            }
            BudgetBreach::AliasAnchorRatio { aliases, anchors } => write!(
                f,
                "excessive alias to anchor ratio ({aliases} aliases for {anchors} anchors)"
            ),
            BudgetBreach::Unbalanced => f.write_str("unbalanced collection end"),
        }
    }
}

/// Counters gathered while scanning, whether or not a limit tripped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded.
    pub breached: Option<BudgetBreach>,
    pub events: usize,
    pub aliases: usize,
    pub anchors: usize,
    pub documents: usize,
    pub nodes: usize,
    /// Deepest nesting reached.
    pub max_depth: usize,
    /// Saturating on overflow.
    pub total_scalar_bytes: usize,
    pub merge_keys: usize,
}

/// Enforces a [`Budget`] over a stream of [`Event`]s.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
    depth: usize,
    containers: Vec<ContainerState>,
}

#[derive(Clone, Copy, Debug)]
enum ContainerState {
    Sequence {
        from_mapping_value: bool,
    },
    Mapping {
        expecting_key: bool,
        from_mapping_value: bool,
    },
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
            depth: 0,
            containers: Vec::with_capacity(64),
        }
    }

    /// Account for `ev`. Returns the breach as soon as a limit is exceeded.
    pub fn observe(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        self.report.events += 1;
        if self.report.events > self.budget.max_events {
            return Err(BudgetBreach::Events {
                events: self.report.events,
            });
        }

        match &ev.kind {
            EventKind::StreamStart
            | EventKind::StreamEnd
            | EventKind::DocumentEnd { .. }
            | EventKind::Comment { .. } => {}
            EventKind::DocumentStart { .. } => {
                self.report.documents += 1;
                if self.report.documents > self.budget.max_documents {
                    return Err(BudgetBreach::Documents {
                        documents: self.report.documents,
                    });
                }
            }
            EventKind::Alias(_) => {
                self.report.aliases += 1;
                if self.report.aliases > self.budget.max_aliases {
                    return Err(BudgetBreach::Aliases {
                        aliases: self.report.aliases,
                    });
                }
                self.finish_node();
            }
            EventKind::Scalar(scalar) => {
                self.bump_nodes()?;
                self.report.total_scalar_bytes = self
                    .report
                    .total_scalar_bytes
                    .saturating_add(scalar.value.len());
                if self.report.total_scalar_bytes > self.budget.max_total_scalar_bytes {
                    return Err(BudgetBreach::ScalarBytes {
                        total_scalar_bytes: self.report.total_scalar_bytes,
                    });
                }
                self.record_anchor(ev)?;
                let merge_key = scalar.tag.is_none()
                    && scalar.style == ScalarStyle::Plain
                    && scalar.value == "<<";
                self.handle_scalar(merge_key)?;
            }
            EventKind::SequenceStart(_) | EventKind::MappingStart(_) => {
                self.bump_nodes()?;
                self.depth = self.depth.saturating_add(1);
                self.report.max_depth = self.report.max_depth.max(self.depth);
                if self.report.max_depth > self.budget.max_depth {
                    return Err(BudgetBreach::Depth {
                        depth: self.report.max_depth,
                    });
                }
                let from_mapping_value = self.entering_container();
                let state = if matches!(ev.kind, EventKind::SequenceStart(_)) {
                    ContainerState::Sequence { from_mapping_value }
                } else {
                    ContainerState::Mapping {
                        expecting_key: true,
                        from_mapping_value,
                    }
                };
                self.containers.push(state);
                self.record_anchor(ev)?;
            }
            EventKind::SequenceEnd | EventKind::MappingEnd => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or(BudgetBreach::Unbalanced)?;
                let from_mapping_value = match (self.containers.pop(), &ev.kind) {
                    (
                        Some(ContainerState::Sequence { from_mapping_value }),
                        EventKind::SequenceEnd,
                    )
                    | (
                        Some(ContainerState::Mapping {
                            from_mapping_value, ..
                        }),
                        EventKind::MappingEnd,
                    ) => from_mapping_value,
                    _ => return Err(BudgetBreach::Unbalanced),
                };
                if from_mapping_value {
                    self.finish_value();
                }
            }
        }
        Ok(())
    }

    fn bump_nodes(&mut self) -> Result<(), BudgetBreach> {
        self.report.nodes += 1;
        if self.report.nodes > self.budget.max_nodes {
            return Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            });
        }
        Ok(())
    }

    fn record_anchor(&mut self, ev: &Event) -> Result<(), BudgetBreach> {
        if ev.anchor().is_some() {
            self.report.anchors += 1;
            if self.report.anchors > self.budget.max_anchors {
                return Err(BudgetBreach::Anchors {
                    anchors: self.report.anchors,
                });
            }
        }
        Ok(())
    }

    fn handle_scalar(&mut self, merge_key: bool) -> Result<(), BudgetBreach> {
        if let Some(ContainerState::Mapping { expecting_key, .. }) = self.containers.last_mut() {
            if *expecting_key {
                if merge_key {
                    self.report.merge_keys += 1;
                    if self.report.merge_keys > self.budget.max_merge_keys {
                        return Err(BudgetBreach::MergeKeys {
                            merge_keys: self.report.merge_keys,
                        });
                    }
                }
                *expecting_key = false;
            } else {
                self.finish_value();
            }
        }
        Ok(())
    }

    /// Scalars and aliases complete a key or a value.
    fn finish_node(&mut self) {
        if let Some(ContainerState::Mapping { expecting_key, .. }) = self.containers.last_mut() {
            if *expecting_key {
                *expecting_key = false;
            } else {
                self.finish_value();
            }
        }
    }

    fn entering_container(&mut self) -> bool {
        match self.containers.last_mut() {
            Some(ContainerState::Mapping { expecting_key, .. }) if *expecting_key => {
                *expecting_key = false;
                false
            }
            Some(ContainerState::Mapping { .. }) => true,
            _ => false,
        }
    }

    fn finish_value(&mut self) {
        if let Some(ContainerState::Mapping { expecting_key, .. }) = self.containers.last_mut() {
            *expecting_key = true;
        }
    }

    /// Counters so far, for use after a breach.
    pub fn into_report(self) -> BudgetReport {
        self.report
    }

    /// Apply end-of-stream heuristics (alias/anchor ratio) and return the report.
    pub fn finalize(mut self) -> BudgetReport {
        if let Err(breach) = self.check_ratio() {
            self.report.breached = Some(breach);
        }
        self.report
    }

    pub(crate) fn check_ratio(&self) -> Result<(), BudgetBreach> {
        let r = &self.report;
        if self.budget.enforce_alias_anchor_ratio
            && r.aliases >= self.budget.alias_anchor_min_aliases
            && (r.anchors == 0
                || r.aliases > self.budget.alias_anchor_ratio_multiplier.saturating_mul(r.anchors))
        {
            return Err(BudgetBreach::AliasAnchorRatio {
                aliases: r.aliases,
                anchors: r.anchors,
            });
        }
        Ok(())
    }
}

/// Scan `input` against `budget` without failing on a breach.
///
/// Returns `Ok(report)`; `report.breached.is_some()` means the input should be rejected.
/// Syntax errors are returned as `Err`.
pub fn check_budget(input: &str, budget: &Budget) -> Result<BudgetReport, Error> {
    let options = ParserOptions {
        budget: None,
        with_snippet: false,
        ..ParserOptions::default()
    };
    let mut parser = Parser::with_options(input.chars(), options);
    let mut enforcer = BudgetEnforcer::new(budget.clone());
    while let Some(event) = parser.next_event()? {
        if let Err(breach) = enforcer.observe(&event) {
            let mut report = enforcer.into_report();
            report.breached = Some(breach);
            return Ok(report);
        }
    }
    Ok(enforcer.finalize())
}

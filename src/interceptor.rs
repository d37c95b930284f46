//! Event rewriting between a producer and the [`Emitter`](crate::Emitter).
//!
//! Interceptors run in the order they were added with
//! [`Emitter::with_interceptor`](crate::Emitter::with_interceptor); each one receives the
//! event returned by the previous one. Events are never mutated in place by the emitter,
//! so restyling is done here by returning an adjusted event.
//!
//! ```rust
//! use yaml_events::{parse_str, Emitter, FlowStyleAbove};
//!
//! let mut yaml = String::new();
//! let mut emitter = Emitter::new(&mut yaml).with_interceptor(FlowStyleAbove::new(2));
//! for event in parse_str("a:\n  b:\n    c: 1\n").unwrap() {
//!     emitter.emit(event).unwrap();
//! }
//! emitter.finish().unwrap();
//! drop(emitter);
//! assert_eq!(yaml, "a:\n  b: {c: 1}\n");
//! ```

use std::collections::HashSet;

use ahash::RandomState;

use crate::event::EventKind;
use crate::{CollectionStyle, Error, Event};

/// One step of the interception chain.
pub trait EventInterceptor {
    fn intercept(&mut self, event: Event) -> Result<Event, Error>;
}

impl<F> EventInterceptor for F
where
    F: FnMut(Event) -> Result<Event, Error>,
{
    fn intercept(&mut self, event: Event) -> Result<Event, Error> {
        self(event)
    }
}

fn force_flow(event: Event) -> Event {
    event.with_collection_style(CollectionStyle::Flow)
}

/// Render every collection nested deeper than `depth` in flow style.
///
/// The root collection is at depth 1, so `FlowStyleAbove::new(0)` makes everything flow.
#[derive(Clone, Debug)]
pub struct FlowStyleAbove {
    depth: usize,
    current: usize,
}

impl FlowStyleAbove {
    pub fn new(depth: usize) -> Self {
        Self { depth, current: 0 }
    }
}

impl EventInterceptor for FlowStyleAbove {
    fn intercept(&mut self, event: Event) -> Result<Event, Error> {
        match event.kind {
            EventKind::SequenceStart(_) | EventKind::MappingStart(_) => {
                self.current += 1;
                if self.current > self.depth {
                    return Ok(force_flow(event));
                }
            }
            EventKind::SequenceEnd | EventKind::MappingEnd => {
                self.current = self.current.saturating_sub(1);
            }
            _ => {}
        }
        Ok(event)
    }
}

/// Render collections whose resolved tag is one of `tags` in flow style.
///
/// Tags are matched against the resolved form carried by the event, for example
/// `tag:yaml.org,2002:omap` rather than `!!omap`.
#[derive(Clone, Debug, Default)]
pub struct ForceFlowForTags {
    tags: HashSet<String, RandomState>,
}

impl ForceFlowForTags {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

impl EventInterceptor for ForceFlowForTags {
    fn intercept(&mut self, event: Event) -> Result<Event, Error> {
        let matches = matches!(
            &event.kind,
            EventKind::SequenceStart(c) | EventKind::MappingStart(c)
                if c.tag.as_ref().is_some_and(|t| self.tags.contains(t))
        );
        Ok(if matches { force_flow(event) } else { event })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(event: &Event) -> Option<CollectionStyle> {
        match &event.kind {
            EventKind::SequenceStart(c) | EventKind::MappingStart(c) => Some(c.style),
            _ => None,
        }
    }

    #[test]
    fn depth_counting() {
        let mut flow = FlowStyleAbove::new(1);
        let outer = flow.intercept(Event::mapping_start(CollectionStyle::Block)).unwrap();
        assert_eq!(style_of(&outer), Some(CollectionStyle::Block));
        let inner = flow.intercept(Event::sequence_start(CollectionStyle::Block)).unwrap();
        assert_eq!(style_of(&inner), Some(CollectionStyle::Flow));
        flow.intercept(Event::sequence_end()).unwrap();
        let sibling = flow.intercept(Event::mapping_start(CollectionStyle::Any)).unwrap();
        assert_eq!(style_of(&sibling), Some(CollectionStyle::Flow));
        flow.intercept(Event::mapping_end()).unwrap();
        flow.intercept(Event::mapping_end()).unwrap();
        let next = flow.intercept(Event::mapping_start(CollectionStyle::Block)).unwrap();
        assert_eq!(style_of(&next), Some(CollectionStyle::Block));
    }

    #[test]
    fn tags_select_collections() {
        let mut by_tag = ForceFlowForTags::new(["tag:example.com,2024:point"]);
        let tagged = Event::mapping_start(CollectionStyle::Block).with_tag("tag:example.com,2024:point");
        assert_eq!(
            style_of(&by_tag.intercept(tagged).unwrap()),
            Some(CollectionStyle::Flow)
        );
        let other = Event::mapping_start(CollectionStyle::Block).with_tag("tag:example.com,2024:line");
        assert_eq!(
            style_of(&by_tag.intercept(other).unwrap()),
            Some(CollectionStyle::Block)
        );
        let scalar = by_tag.intercept(Event::scalar("x")).unwrap();
        assert_eq!(scalar, Event::scalar("x"));
    }

    #[test]
    fn closures_are_interceptors() {
        let mut seen = 0;
        let mut count = |event: Event| -> Result<Event, Error> {
            seen += 1;
            Ok(event)
        };
        count.intercept(Event::stream_start()).unwrap();
        count.intercept(Event::stream_end()).unwrap();
        assert_eq!(seen, 2);
    }
}

use indoc::indoc;
use yaml_events::{
    check_well_formed, emit_to_string, parse_str, CollectionStyle, Event, EventKind,
    NestingTracker,
};

fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind.clone()).collect()
}

/// Parse, emit, parse again; the event kinds must not change.
fn assert_round_trip(yaml: &str) -> anyhow::Result<String> {
    let first = parse_str(yaml)?;
    let emitted = emit_to_string(&first)?;
    let second = parse_str(&emitted)?;
    assert_eq!(kinds(&first), kinds(&second), "re-emitted as:\n{emitted}");
    Ok(emitted)
}

#[test]
fn block_collections() -> anyhow::Result<()> {
    let yaml = indoc! {"
        name: PandaTea
        tags:
        - a
        - b
        nested:
          deeper:
            value: 1
    "};
    assert_eq!(assert_round_trip(yaml)?, yaml);
    Ok(())
}

#[test]
fn flow_collections() -> anyhow::Result<()> {
    let yaml = "seq: [1, 2, {k: v}]\nempty: []\nnone: {}\n";
    assert_eq!(assert_round_trip(yaml)?, yaml);
    Ok(())
}

#[test]
fn quoted_and_block_scalars() -> anyhow::Result<()> {
    let yaml = indoc! {r#"
        single: 'it''s'
        double: "tab\there"
        literal: |
          line one
          line two
        folded: >
          folded text
    "#};
    assert_eq!(assert_round_trip(yaml)?, yaml);
    Ok(())
}

#[test]
fn anchors_and_aliases() -> anyhow::Result<()> {
    let yaml = "base: &b {x: 1}\nref: *b\n";
    assert_eq!(assert_round_trip(yaml)?, yaml);
    Ok(())
}

#[test]
fn tags() -> anyhow::Result<()> {
    let yaml = "- !!str 12\n- !local x\n- !<urn:y> z\n";
    assert_eq!(assert_round_trip(yaml)?, yaml);
    Ok(())
}

#[test]
fn multiple_documents() -> anyhow::Result<()> {
    let emitted = assert_round_trip("a\n---\nb\n...\n")?;
    assert_eq!(emitted, "a\n--- b\n...\n");
    Ok(())
}

#[test]
fn comments_survive() -> anyhow::Result<()> {
    let yaml = indoc! {"
        # head
        a: 1 # inline
        # between
        b: 2
    "};
    assert_eq!(assert_round_trip(yaml)?, yaml);
    Ok(())
}

#[test]
fn parser_output_is_well_formed() -> anyhow::Result<()> {
    let yaml = indoc! {"
        a:
          - [1, 2]
          - {b: c}
        d: &x
          e: f
        g: *x
    "};
    let events = parse_str(yaml)?;
    check_well_formed(&events)?;

    let mut tracker = NestingTracker::default();
    let mut sum = 0i32;
    for event in &events {
        tracker.observe(event)?;
        sum += event.nesting_increase();
        assert_eq!(tracker.depth() as i32, sum);
    }
    assert_eq!(sum, 0);
    Ok(())
}

#[test]
fn every_alias_follows_its_anchor() -> anyhow::Result<()> {
    let yaml = "a: &one 1\nb: *one\n---\nc: &two 2\nd: *two\n";
    let events = parse_str(yaml)?;
    let mut defined = Vec::new();
    for event in &events {
        match &event.kind {
            EventKind::DocumentStart { .. } => defined.clear(),
            EventKind::Alias(name) => assert!(defined.contains(name), "{name} used before definition"),
            _ => {}
        }
        if let Some(anchor) = event.anchor() {
            defined.push(anchor.clone());
        }
    }
    Ok(())
}

fn scalar_values(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Scalar(s) => Some(s.value.clone()),
            _ => None,
        })
        .collect()
}

fn in_document(body: Vec<Event>) -> Vec<Event> {
    let mut events = vec![Event::stream_start(), Event::document_start(true)];
    events.extend(body);
    events.push(Event::document_end(true));
    events.push(Event::stream_end());
    events
}

/// The same value placed where each scalar style rule differs.
fn placements(value: &str) -> Vec<(&'static str, Vec<Event>)> {
    let s = || Event::scalar(value);
    let other = || Event::scalar("other");
    let collection = |start: Event, end: Event, items: Vec<Event>| {
        let mut body = vec![start];
        body.extend(items);
        body.push(end);
        in_document(body)
    };
    let block_map = || Event::mapping_start(CollectionStyle::Block);
    let block_seq = || Event::sequence_start(CollectionStyle::Block);
    let flow_map = || Event::mapping_start(CollectionStyle::Flow);
    let flow_seq = || Event::sequence_start(CollectionStyle::Flow);
    vec![
        ("root", in_document(vec![s()])),
        ("block key", collection(block_map(), Event::mapping_end(), vec![s(), other()])),
        ("block value", collection(block_map(), Event::mapping_end(), vec![other(), s()])),
        ("block item", collection(block_seq(), Event::sequence_end(), vec![s(), other()])),
        ("flow item", collection(flow_seq(), Event::sequence_end(), vec![s(), other()])),
        ("flow key", collection(flow_map(), Event::mapping_end(), vec![s(), other()])),
        ("flow value", collection(flow_map(), Event::mapping_end(), vec![other(), s()])),
    ]
}

#[test]
fn hand_built_scalars_survive_emit_and_parse() -> anyhow::Result<()> {
    let values = [
        "€x", "日本", "a\u{2028}b", "a\u{2029}", "\u{85}", "x\u{85}y", "a\rb", " lead",
        "trail ", "- a", "#x", "", "a\nb", "true", "x: y", "0x1F", "plain words",
    ];
    for value in values {
        for (place, events) in placements(value) {
            let yaml = emit_to_string(&events)?;
            let back = parse_str(&yaml)
                .map_err(|e| anyhow::anyhow!("{value:?} as {place} emitted {yaml:?}: {e}"))?;
            assert_eq!(
                scalar_values(&back),
                scalar_values(&events),
                "{value:?} as {place} emitted {yaml:?}"
            );
        }
    }
    Ok(())
}

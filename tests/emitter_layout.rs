use indoc::indoc;
use yaml_events::{
    emit_to_string, emit_to_string_with_options, emitter_options, parse_str, CollectionStart,
    CollectionStyle, Emitter, Error, Event, EventKind, FlowStyleAbove, ForceFlowForTags,
    LineBreak, Mark, ScalarStyle,
};

fn document(body: Vec<Event>) -> Vec<Event> {
    let mut events = vec![Event::stream_start(), Event::document_start(true)];
    events.extend(body);
    events.push(Event::document_end(true));
    events.push(Event::stream_end());
    events
}

fn emit_with<I: yaml_events::EventInterceptor + 'static>(
    events: Vec<Event>,
    interceptor: I,
) -> anyhow::Result<String> {
    let mut out = String::new();
    let mut emitter = Emitter::new(&mut out).with_interceptor(interceptor);
    for event in events {
        emitter.emit(event)?;
    }
    emitter.finish()?;
    drop(emitter);
    Ok(out)
}

#[test]
fn single_key_mapping() -> anyhow::Result<()> {
    let events = document(vec![
        Event::mapping_start(CollectionStyle::Block),
        Event::scalar("name"),
        Event::scalar("PandaTea"),
        Event::mapping_end(),
    ]);
    assert_eq!(emit_to_string(&events)?, "name: PandaTea\n");
    Ok(())
}

#[test]
fn keys_align_under_the_dash() -> anyhow::Result<()> {
    let events = document(vec![
        Event::sequence_start(CollectionStyle::Block),
        Event::mapping_start(CollectionStyle::Block),
        Event::scalar("Age"),
        Event::scalar("100").with_style(ScalarStyle::Plain),
        Event::scalar("Name"),
        Event::scalar("PandaTea"),
        Event::mapping_end(),
        Event::sequence_end(),
    ]);
    assert_eq!(emit_to_string(&events)?, "- Age: 100\n  Name: PandaTea\n");
    Ok(())
}

#[test]
fn indent_step_applies_per_level() -> anyhow::Result<()> {
    let events = parse_str("a:\n  b:\n    c: [1, 2]\n  d: |\n    text\n")?;
    let yaml = emit_to_string_with_options(&events, emitter_options! { indent_step: 4 })?;
    assert_eq!(
        yaml,
        indoc! {"
            a:
                b:
                    c: [1, 2]
                d: |
                    text
        "}
    );
    Ok(())
}

#[test]
fn strings_that_look_like_other_types_are_quoted() -> anyhow::Result<()> {
    let mut body = vec![Event::sequence_start(CollectionStyle::Block)];
    for value in ["true", "No", "~", "0x1F", "-2.5e3", ".NaN", "", "- x", "a: b", "a #b", " x"] {
        body.push(Event::scalar(value));
    }
    body.push(Event::sequence_end());
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(
        yaml,
        indoc! {"
            - 'true'
            - 'No'
            - '~'
            - '0x1F'
            - '-2.5e3'
            - '.NaN'
            - ''
            - '- x'
            - 'a: b'
            - 'a #b'
            - ' x'
        "}
    );
    let back = parse_str(&yaml)?;
    let values: Vec<&str> = back
        .iter()
        .filter_map(|e| match &e.kind {
            EventKind::Scalar(s) => Some(s.value.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(values[0], "true");
    assert_eq!(values[10], " x");
    Ok(())
}

#[test]
fn requested_styles_are_downgraded_when_impossible() -> anyhow::Result<()> {
    let mut body = vec![Event::mapping_start(CollectionStyle::Block)];
    body.push(Event::scalar("k").with_style(ScalarStyle::Literal));
    body.push(Event::scalar("two\nlines").with_style(ScalarStyle::Plain));
    body.push(Event::scalar("flow"));
    body.push(Event::sequence_start(CollectionStyle::Flow));
    body.push(Event::scalar("x\ny").with_style(ScalarStyle::Literal));
    body.push(Event::sequence_end());
    body.push(Event::mapping_end());
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(yaml, "\"k\": 'two\n\n  lines'\nflow: [\"x\\ny\"]\n");
    Ok(())
}

#[test]
fn default_flow_and_explicit_start() -> anyhow::Result<()> {
    let events = document(vec![
        Event::mapping_start(CollectionStyle::Any),
        Event::scalar("a"),
        Event::sequence_start(CollectionStyle::Any),
        Event::scalar("x"),
        Event::sequence_end(),
        Event::mapping_end(),
    ]);
    let options = emitter_options! {
        default_flow: true,
        explicit_document_start: true,
    };
    assert_eq!(emit_to_string_with_options(&events, options)?, "--- {a: [x]}\n");
    Ok(())
}

#[test]
fn canonical_form() -> anyhow::Result<()> {
    let events = parse_str("a: [1]\n")?;
    let yaml = emit_to_string_with_options(&events, emitter_options! { canonical: true })?;
    assert_eq!(
        yaml,
        indoc! {r#"
            ---
            !!map {
              ? !!str "a"
              : !!seq [
                !!str "1",
              ],
            }
        "#}
    );
    Ok(())
}

#[test]
fn line_break_choice() -> anyhow::Result<()> {
    let events = parse_str("a: 1\nb: 2\n")?;
    let crlf = emit_to_string_with_options(&events, emitter_options! { line_break: LineBreak::CrLf })?;
    assert_eq!(crlf, "a: 1\r\nb: 2\r\n");
    let cr = emit_to_string_with_options(&events, emitter_options! { line_break: LineBreak::Cr })?;
    assert_eq!(cr, "a: 1\rb: 2\r");
    Ok(())
}

#[test]
fn unicode_can_be_escaped() -> anyhow::Result<()> {
    let events = document(vec![Event::scalar("Grüße 😀")]);
    assert_eq!(emit_to_string(&events)?, "Grüße 😀\n");
    let yaml = emit_to_string_with_options(&events, emitter_options! { unicode: false })?;
    assert_eq!(yaml, "\"Gr\\xFC\\xDFe \\U0001F600\"\n");
    Ok(())
}

#[test]
fn cyclic_anchor_is_written_once() -> anyhow::Result<()> {
    let anchor = yaml_events::AnchorName::new("A")?;
    let events = document(vec![
        Event::mapping_start(CollectionStyle::Block).with_anchor(anchor),
        Event::scalar("self"),
        Event::alias("A")?,
        Event::mapping_end(),
    ]);
    assert_eq!(emit_to_string(&events)?, "&A\nself: *A\n");
    Ok(())
}

#[test]
fn alias_before_anchor_is_rejected() -> anyhow::Result<()> {
    let events = document(vec![Event::alias("later")?]);
    let err = emit_to_string(&events).unwrap_err();
    assert!(matches!(err, Error::UnknownAnchor { ref name, .. } if name == "later"));
    Ok(())
}

#[test]
fn flow_above_depth() -> anyhow::Result<()> {
    let events = parse_str("a:\n  b:\n    c: 1\n  d:\n  - e\n")?;
    let yaml = emit_with(events, FlowStyleAbove::new(2))?;
    assert_eq!(yaml, "a:\n  b: {c: 1}\n  d: [e]\n");
    Ok(())
}

#[test]
fn flow_for_tagged_collections() -> anyhow::Result<()> {
    let point = CollectionStart {
        tag: Some("tag:example.com,2024:point".to_owned()),
        implicit: true,
        style: CollectionStyle::Block,
        ..CollectionStart::default()
    };
    let events = document(vec![
        Event::mapping_start(CollectionStyle::Block),
        Event::scalar("origin"),
        Event::new(EventKind::MappingStart(point), Mark::EMPTY, Mark::EMPTY),
        Event::scalar("x"),
        Event::scalar("0").with_style(ScalarStyle::Plain),
        Event::mapping_end(),
        Event::scalar("size"),
        Event::mapping_start(CollectionStyle::Block),
        Event::scalar("w"),
        Event::scalar("1").with_style(ScalarStyle::Plain),
        Event::mapping_end(),
        Event::mapping_end(),
    ]);
    let yaml = emit_with(events, ForceFlowForTags::new(["tag:example.com,2024:point"]))?;
    assert_eq!(yaml, "origin: {x: 0}\nsize:\n  w: 1\n");
    Ok(())
}

#[test]
fn interceptors_run_in_order() -> anyhow::Result<()> {
    fn rename(from: &'static str, to: &'static str) -> impl FnMut(Event) -> Result<Event, Error> {
        move |mut event: Event| {
            if let EventKind::Scalar(s) = &mut event.kind {
                if s.value == from {
                    s.value = to.to_owned();
                }
            }
            Ok(event)
        }
    }

    let mut out = String::new();
    let mut emitter = Emitter::new(&mut out)
        .with_interceptor(rename("x", "y"))
        .with_interceptor(rename("y", "z"));
    for event in document(vec![Event::scalar("x")]) {
        emitter.emit(event)?;
    }
    emitter.finish()?;
    drop(emitter);
    assert_eq!(out, "z\n");
    Ok(())
}

#[test]
fn interceptor_errors_stop_the_emitter() -> anyhow::Result<()> {
    let mut out = String::new();
    let mut emitter = Emitter::new(&mut out).with_interceptor(|event: Event| {
        if event.is_comment() {
            Err(Error::Construction {
                problem: "comments are not allowed here".to_owned(),
            })
        } else {
            Ok(event)
        }
    });
    emitter.emit(Event::stream_start())?;
    assert!(emitter.emit(Event::comment("no", false)).is_err());
    assert!(emitter.emit(Event::document_start(true)).is_err());
    Ok(())
}

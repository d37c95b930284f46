use std::io::Cursor;

use yaml_events::{
    budget, check_budget, emit_to_string, parse_str, parse_str_with_options, parser_options,
    BudgetBreach, Error, Event, EventKind, Parser, Stage,
};

#[test]
fn scanner_errors_are_classified() {
    let err = parse_str("a: \"unterminated\n").unwrap_err();
    assert_eq!(err.stage(), Stage::Scanner);
    assert!(err.mark().is_some());
    assert!(err.to_string().contains("unexpected end of stream"));
}

#[test]
fn nul_in_the_input_is_an_error() {
    let err = parse_str("a: 1\n\0b: 2\n").unwrap_err();
    assert_eq!(err.stage(), Stage::Scanner);
    assert_eq!(err.mark().map(|m| m.line()), Some(2));
}

#[test]
fn parser_errors_are_classified() {
    let err = parse_str("- a\nb: c\n").unwrap_err();
    assert_eq!(err.stage(), Stage::Parser);

    let err = parse_str("key: *nope\n").unwrap_err();
    assert!(matches!(err.without_snippet(), Error::UndefinedAlias { ref name, .. } if name == "nope"));
}

#[test]
fn snippets_show_the_offending_line() {
    let err = parse_str("ok: 1\nbad: *missing\n").unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("bad: *missing"), "{rendered}");
    assert_eq!(err.mark().map(|m| m.line()), Some(2));
}

#[test]
fn emitter_errors_are_classified() {
    let events = [Event::document_start(true), Event::scalar("x")];
    let err = emit_to_string(&events).unwrap_err();
    assert_eq!(err.stage(), Stage::Emitter);

    let events = [Event::stream_start(), Event::stream_end()];
    assert_eq!(emit_to_string(&events).unwrap(), "");

    let events = [Event::stream_start()];
    assert!(emit_to_string(&events).is_err());
}

#[test]
fn construction_errors() {
    assert_eq!(
        Event::alias("has space").unwrap_err().stage(),
        Stage::Construction
    );
}

#[test]
fn budget_limits_depth() {
    let options = parser_options! {
        budget: Some(budget! { max_depth: 2 }),
        with_snippet: false,
    };
    let err = parse_str_with_options("a: {b: {c: 1}}\n", options).unwrap_err();
    assert!(matches!(
        err,
        Error::Budget { breach: BudgetBreach::Depth { .. }, .. }
    ));

    let report = check_budget("a: {b: {c: 1}}\n", &budget! { max_depth: 2 }).unwrap();
    assert!(matches!(report.breached, Some(BudgetBreach::Depth { .. })));
}

#[test]
fn reader_input_is_decoded() -> anyhow::Result<()> {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in "name: Grüße\n".encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    let events = Parser::from_reader(Cursor::new(bytes)).collect::<Result<Vec<_>, _>>()?;
    let values: Vec<String> = events
        .into_iter()
        .filter_map(|e| match e.kind {
            EventKind::Scalar(s) => Some(s.value),
            _ => None,
        })
        .collect();
    assert_eq!(values, ["name", "Grüße"]);
    Ok(())
}

#[test]
fn reader_input_cap() {
    let yaml = "key: value\n".repeat(100);
    let options = parser_options! { max_input_bytes: Some(64) };
    let result = Parser::from_reader_with_options(Cursor::new(yaml.into_bytes()), options)
        .collect::<Result<Vec<_>, _>>();
    let err = result.unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
    assert_eq!(err.stage(), Stage::Io);
}

#[test]
fn parser_stops_after_error() {
    let mut parser = Parser::new("a: [\n".chars());
    let mut saw_error = false;
    for item in parser.by_ref() {
        if item.is_err() {
            saw_error = true;
        }
    }
    assert!(saw_error);
    assert!(parser.next().is_none());
}

use indoc::indoc;
use yaml_events::{emit_to_string, CollectionStyle, Event, ScalarStyle};

fn document(body: Vec<Event>) -> Vec<Event> {
    let mut events = vec![Event::stream_start(), Event::document_start(true)];
    events.extend(body);
    events.push(Event::document_end(true));
    events.push(Event::stream_end());
    events
}

fn block_map() -> Event {
    Event::mapping_start(CollectionStyle::Block)
}

fn plain(value: &str) -> Event {
    Event::scalar(value).with_style(ScalarStyle::Plain)
}

fn above(text: &str) -> Event {
    Event::comment(text, false)
}

fn inline(text: &str) -> Event {
    Event::comment(text, true)
}

/// Name and age of a person, each preceded by a block comment.
fn person(name: &str, age: &str) -> Vec<Event> {
    vec![
        block_map(),
        above("The person's name"),
        Event::scalar("Name"),
        Event::scalar(name),
        above("The person's age"),
        Event::scalar("Age"),
        plain(age),
        Event::mapping_end(),
    ]
}

#[test]
fn comments_above_top_level_keys() -> anyhow::Result<()> {
    let yaml = emit_to_string(&document(person("PandaTea", "100")))?;
    assert_eq!(
        yaml,
        indoc! {"
            # The person's name
            Name: PandaTea
            # The person's age
            Age: 100
        "}
    );
    Ok(())
}

#[test]
fn first_comment_shares_the_dash_line() -> anyhow::Result<()> {
    let mut body = vec![Event::sequence_start(CollectionStyle::Block)];
    body.extend(person("PandaTea", "100"));
    body.push(Event::sequence_end());
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(
        yaml,
        indoc! {"
            - # The person's name
              Name: PandaTea
              # The person's age
              Age: 100
        "}
    );
    Ok(())
}

#[test]
fn multiline_block_comment_in_nested_mapping() -> anyhow::Result<()> {
    let mut body = vec![block_map(), Event::scalar("Car"), block_map()];
    body.push(above("The car's rightful owner\nor:\r\nThis person owns the car"));
    body.push(Event::scalar("Owner"));
    body.extend(person("PandaTea", "100"));
    body.push(Event::mapping_end());
    body.push(Event::mapping_end());
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(
        yaml,
        indoc! {"
            Car:
              # The car's rightful owner
              # or:
              # This person owns the car
              Owner:
                # The person's name
                Name: PandaTea
                # The person's age
                Age: 100
        "}
    );
    Ok(())
}

#[test]
fn indentless_sequence_items_with_comments() -> anyhow::Result<()> {
    let mut body = vec![block_map(), Event::scalar("Passengers")];
    body.push(Event::sequence_start(CollectionStyle::Block));
    body.extend(person("PandaTea", "100"));
    body.extend(person("Paul", "50"));
    body.push(Event::sequence_end());
    body.push(Event::mapping_end());
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(
        yaml,
        indoc! {"
            Passengers:
            - # The person's name
              Name: PandaTea
              # The person's age
              Age: 100
            - # The person's name
              Name: Paul
              # The person's age
              Age: 50
        "}
    );
    Ok(())
}

#[test]
fn flow_mapping_drops_comments() -> anyhow::Result<()> {
    let mut owner = person("Paul", "50");
    owner[0] = Event::mapping_start(CollectionStyle::Flow);
    let mut body = vec![block_map(), Event::scalar("Owner")];
    body.extend(owner);
    body.push(Event::mapping_end());
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(yaml, "Owner: {Name: Paul, Age: 50}\n");
    Ok(())
}

#[test]
fn inline_comments_after_key_and_value() -> anyhow::Result<()> {
    let body = vec![
        block_map(),
        Event::scalar("Child"),
        block_map(),
        inline("Child: Inline for reference type"),
        Event::scalar("Foo"),
        plain("0"),
        inline("Foo: Inline and single-line"),
        Event::mapping_end(),
        Event::scalar("Bar"),
        Event::scalar("00:00:00"),
        inline("Bar: Inline\nand concatenated\nmulti-line"),
        Event::mapping_end(),
    ];
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(
        yaml,
        indoc! {"
            Child: # Child: Inline for reference type
              Foo: 0 # Foo: Inline and single-line
            Bar: 00:00:00 # Bar: Inline and concatenated multi-line
        "}
    );
    Ok(())
}

#[test]
fn inline_comment_on_empty_value() -> anyhow::Result<()> {
    let body = vec![
        block_map(),
        Event::scalar("Children"),
        inline("Children: Inline for sequence type"),
        plain(""),
        Event::mapping_end(),
    ];
    let yaml = emit_to_string(&document(body))?;
    assert_eq!(yaml, "Children: # Children: Inline for sequence type\n");
    Ok(())
}

#[test]
fn comment_between_documents() -> anyhow::Result<()> {
    let events = vec![
        Event::stream_start(),
        above("leading"),
        Event::document_start(true),
        Event::scalar("first"),
        Event::document_end(true),
        above("second document"),
        Event::document_start(false),
        Event::scalar("second"),
        Event::document_end(true),
        Event::stream_end(),
    ];
    let yaml = emit_to_string(&events)?;
    assert_eq!(yaml, "# leading\nfirst\n# second document\n--- second\n");
    Ok(())
}

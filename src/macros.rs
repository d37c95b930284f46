//! Macros for building option structs from `Default` plus field assignments, so new fields
//! can be added without breaking call sites that use struct literal syntax.

/// Construct [`crate::ParserOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let options = yaml_events::parser_options! {
///     with_comments: false,
///     crop_radius: 0,
/// };
/// assert!(!options.with_comments);
/// ```
#[macro_export]
macro_rules! parser_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::ParserOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::EmitterOptions`] from `Default` and a list of field assignments.
///
/// ```rust
/// let options = yaml_events::emitter_options! {
///     indent_step: 4,
///     canonical: true,
/// };
/// assert_eq!(options.indent_step, 4);
/// ```
#[macro_export]
macro_rules! emitter_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::EmitterOptions::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// ```rust
/// let budget = yaml_events::budget! {
///     max_documents: 2,
///     enforce_alias_anchor_ratio: false,
/// };
/// assert_eq!(budget.max_documents, 2);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            budget.$field = $value;
        )*
        budget
    }};
}

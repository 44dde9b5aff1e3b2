/// Compiles a regex literal once and hands out a `&'static Regex`
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
            regex::Regex::new($pat).expect("regex literal must compile")
        });
        &*RE
    }};
}

//! Best-effort call-site capture
//!
//! Logger methods are `#[track_caller]`, so the location of the user's call
//! is always known. Turning that location into `function`/`source` values is
//! delegated to a [`CallSiteResolver`]; when nothing can be resolved the
//! placeholders `n/a` are used instead of failing the log call.

use std::panic::Location;

/// Placeholder for call-site values that could not be resolved
pub const UNKNOWN: &str = "n/a";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub function: String,
    pub source: String,
}

impl CallSite {
    pub fn new(function: impl Into<String>, file: &str, line: u32) -> Self {
        Self {
            function: function.into(),
            source: format!("{}:{}", file, line),
        }
    }

    pub fn unknown() -> Self {
        Self {
            function: UNKNOWN.to_string(),
            source: UNKNOWN.to_string(),
        }
    }
}

pub trait CallSiteResolver: Send + Sync {
    fn resolve(&self, location: &'static Location<'static>) -> Option<CallSite>;
}

/// Reports `file:line` of the caller; the function name is not available
/// from a location alone, the logging macros supply it instead
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationResolver;

impl CallSiteResolver for LocationResolver {
    fn resolve(&self, location: &'static Location<'static>) -> Option<CallSite> {
        Some(CallSite::new(UNKNOWN, location.file(), location.line()))
    }
}

/// Never resolves anything; every record carries `n/a`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCallSite;

impl CallSiteResolver for NoCallSite {
    fn resolve(&self, _location: &'static Location<'static>) -> Option<CallSite> {
        None
    }
}

/// Strip the closure and helper segments `type_name` adds to a function path
#[doc(hidden)]
pub fn clean_function_path(raw: &'static str) -> &'static str {
    let mut name = raw.strip_suffix("::__here").unwrap_or(raw);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    name
}

/// Path of the enclosing function, e.g. `my_crate::server::start`
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::core::call_site::clean_function_path(__type_name_of(__here))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_resolver_reports_file_and_line() {
        let location = Location::caller();
        let site = LocationResolver.resolve(location).unwrap();
        assert_eq!(site.function, UNKNOWN);
        assert!(site.source.starts_with(file!()));
        assert!(site.source.ends_with(&format!(":{}", location.line())));
    }

    #[test]
    fn test_no_call_site_resolves_nothing() {
        assert!(NoCallSite.resolve(Location::caller()).is_none());
        assert_eq!(CallSite::unknown().source, UNKNOWN);
    }

    #[test]
    fn test_function_path_macro() {
        let path = crate::__function_path!();
        assert_eq!(
            path,
            "scribe::core::call_site::tests::test_function_path_macro"
        );

        let from_closure = (|| crate::__function_path!())();
        assert_eq!(
            from_closure,
            "scribe::core::call_site::tests::test_function_path_macro"
        );
    }
}

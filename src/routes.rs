use std::fmt::Display;

/// The paths both sides of the protocol agree on.
/// The adapter mounts exactly these and the proxy only ever requests these,
/// so neither side spells a path out on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Negotiate,
    Records,
    PropertyValuesEqual,
    AdjustEndpoints,
}
impl Route {
    pub const ALL: [Route; 4] = [
        Route::Negotiate,
        Route::Records,
        Route::PropertyValuesEqual,
        Route::AdjustEndpoints,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            Route::Negotiate => "/",
            Route::Records => "/records",
            Route::PropertyValuesEqual => "/propertyvaluesequal",
            Route::AdjustEndpoints => "/adjustendpoints",
        }
    }

    /// The path without its leading slash, to be joined onto a base URL
    /// that may carry a path prefix of its own.
    pub fn relative(self) -> &'static str {
        self.path().trim_start_matches('/')
    }
}
impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

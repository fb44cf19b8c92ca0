use crate::artifact::SnapshotIdentity;
use crate::engine::Mode;

/// What a test needs to provide to take snapshots: who it is, and whether
/// it records or verifies.
pub trait SnapshotTestCase {
    /// Identity of the snapshot named `identifier` taken by this test.
    fn identity(&self, identifier: &str) -> SnapshotIdentity;

    fn snapshot_mode(&self) -> Mode;
}

/// Plain [`SnapshotTestCase`] for tests that are ordinary functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub case_name: String,
    pub method_name: String,
    pub mode: Mode,
}

impl TestCase {
    pub fn new(case_name: impl Into<String>, method_name: impl Into<String>, mode: Mode) -> Self {
        Self {
            case_name: case_name.into(),
            method_name: method_name.into(),
            mode,
        }
    }

    /// Splits a function path such as `my_crate::button::renders` into
    /// case `my_crate::button` and method `renders`.
    pub fn from_function_path(path: &str, mode: Mode) -> Self {
        match path.rsplit_once("::") {
            Some((case, method)) => Self::new(case, method, mode),
            None => Self::new("", path, mode),
        }
    }
}

impl SnapshotTestCase for TestCase {
    fn identity(&self, identifier: &str) -> SnapshotIdentity {
        SnapshotIdentity::new(&self.case_name, &self.method_name, identifier)
    }

    fn snapshot_mode(&self) -> Mode {
        self.mode
    }
}

/// Builds a [`TestCase`] named after the enclosing function and module.
///
/// ```
/// use viewsnap::{named_test_case, Mode};
///
/// fn renders_button() {
///     let case = named_test_case!(Mode::Verify);
///     assert_eq!(case.method_name, "renders_button");
/// }
/// # renders_button();
/// ```
#[macro_export]
macro_rules! named_test_case {
    ($mode:expr) => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        $crate::TestCase::from_function_path(name, $mode)
    }};
}

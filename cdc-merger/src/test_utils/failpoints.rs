use fail::FailScenario;

/// Configures fail points for the lifetime of the value and turns them off on
/// drop.
pub struct CustomFailScenario<'a> {
    _scenario: FailScenario<'a>,
    failpoints: Vec<String>,
}

impl<'a> CustomFailScenario<'a> {
    /// Applies each `(name, action)` pair, e.g. `("write_dataset.before_commit", "return")`.
    pub fn setup(failpoints: &[(&str, &str)]) -> CustomFailScenario<'a> {
        let scenario = FailScenario::setup();

        for (name, action) in failpoints {
            fail::cfg(*name, action).expect("invalid fail point action");
        }

        Self {
            _scenario: scenario,
            failpoints: failpoints.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

impl Drop for CustomFailScenario<'_> {
    fn drop(&mut self) {
        for name in &self.failpoints {
            fail::remove(name);
        }
    }
}

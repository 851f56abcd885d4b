//! Rate laws attached to a single source brick.

use hf_core::same_tag;

use crate::common::even_share;
use crate::error::{ComponentError, ComponentResult};
use crate::flux::Link;
use crate::parameter::{EvalContext, ParameterSet, ParameterValue};

/// Supported process types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProcessKind {
    /// `rate = response_factor * S`
    #[default]
    OutflowLinear,
    /// `rate = rate`, independent of the content.
    OutflowConstant,
}

impl ProcessKind {
    pub fn from_tag(tag: &str) -> ComponentResult<Self> {
        const TABLE: &[(&str, ProcessKind)] = &[
            ("outflow:linear", ProcessKind::OutflowLinear),
            ("outflow_linear", ProcessKind::OutflowLinear),
            ("outflow:constant", ProcessKind::OutflowConstant),
            ("outflow_constant", ProcessKind::OutflowConstant),
        ];
        TABLE
            .iter()
            .find(|(alias, _)| same_tag(alias, tag))
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ComponentError::unsupported("process", tag))
    }

    /// Name of the parameter driving this rate law.
    pub fn parameter_name(self) -> &'static str {
        match self {
            ProcessKind::OutflowLinear => "response_factor",
            ProcessKind::OutflowConstant => "rate",
        }
    }
}

/// A process owns its parameter provider and the rate slots it writes.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    kind: ProcessKind,
    parameter: ParameterValue,
    outputs: Vec<Link>,
}

impl Process {
    /// Bind a process to the parameters of `owner`.
    pub fn new(
        kind: ProcessKind,
        owner: &str,
        parameters: &ParameterSet,
        outputs: Vec<Link>,
    ) -> ComponentResult<Self> {
        let name = kind.parameter_name();
        let parameter = parameters.require(owner, name)?.clone();
        if parameter.values().iter().any(|v| v.is_nan() || *v < 0.0) {
            return Err(ComponentError::InvalidArg {
                what: format!("'{name}' on '{owner}' must be non-negative"),
            });
        }
        Ok(Self {
            kind,
            parameter,
            outputs,
        })
    }

    pub fn kind(&self) -> ProcessKind {
        self.kind
    }

    pub fn outputs(&self) -> &[Link] {
        &self.outputs
    }

    /// Total outgoing rate for a (possibly trial) content.
    pub fn total_rate(&self, content: f64, ctx: &EvalContext) -> f64 {
        let p = self.parameter.value_at(ctx);
        match self.kind {
            ProcessKind::OutflowLinear => p * content.max(0.0),
            ProcessKind::OutflowConstant => p,
        }
    }

    /// Write one rate per output flux. Recomputed on every call.
    pub fn write_rates(&self, content: f64, ctx: &EvalContext, rates: &mut [f64]) {
        let share = even_share(self.total_rate(content, ctx), self.outputs.len());
        for link in &self.outputs {
            rates[link.slot] = share;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;
    use chrono::NaiveDate;
    use hf_core::FluxId;

    fn ctx() -> EvalContext {
        EvalContext::new(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
    }

    #[test]
    fn tags_parse_regardless_of_case() {
        assert_eq!(
            ProcessKind::from_tag("Outflow:Linear").unwrap(),
            ProcessKind::OutflowLinear
        );
        assert_eq!(
            ProcessKind::from_tag("OUTFLOW:CONSTANT").unwrap(),
            ProcessKind::OutflowConstant
        );
        assert!(matches!(
            ProcessKind::from_tag("outflow:nonlinear"),
            Err(ComponentError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn linear_rate_is_shared_between_outputs() {
        let params: ParameterSet = [Parameter::constant("response_factor", 0.5)]
            .into_iter()
            .collect();
        let outputs = vec![
            Link::new(FluxId::from_index(0), 0),
            Link::new(FluxId::from_index(1), 2),
        ];
        let process = Process::new(ProcessKind::OutflowLinear, "slow", &params, outputs).unwrap();

        let mut rates = [0.0; 3];
        process.write_rates(10.0, &ctx(), &mut rates);
        assert_eq!(rates, [2.5, 0.0, 2.5]);
    }

    #[test]
    fn linear_rate_ignores_negative_trial_content() {
        let params: ParameterSet = [Parameter::constant("response_factor", 0.5)]
            .into_iter()
            .collect();
        let process = Process::new(ProcessKind::OutflowLinear, "slow", &params, vec![]).unwrap();
        assert_eq!(process.total_rate(-4.0, &ctx()), 0.0);
    }

    #[test]
    fn missing_parameter_is_reported() {
        let err = Process::new(
            ProcessKind::OutflowConstant,
            "slow",
            &ParameterSet::new(),
            vec![],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ComponentError::MissingParameter {
                owner: "slow".into(),
                name: "rate".into()
            }
        );
    }

    #[test]
    fn negative_rate_parameters_are_rejected() {
        let params: ParameterSet = [Parameter::constant("response_factor", -0.1)]
            .into_iter()
            .collect();
        let err = Process::new(ProcessKind::OutflowLinear, "slow", &params, vec![]).unwrap_err();
        assert!(matches!(err, ComponentError::InvalidArg { .. }));

        let mut monthly = [2.0; 12];
        monthly[6] = -1.0;
        let params: ParameterSet = [Parameter {
            name: "rate".into(),
            value: ParameterValue::Monthly(monthly),
        }]
        .into_iter()
        .collect();
        assert!(Process::new(ProcessKind::OutflowConstant, "slow", &params, vec![]).is_err());
    }
}

//! Maps positional constructor arguments onto ABI parameter names.

use chronicle_types::{ConstructorAbi, ConstructorInputs, ConstructorValue};
use indexmap::IndexMap;

use crate::error::LedgerError;

/// Pair each argument with its constructor parameter.
///
/// Tuple parameters are decomposed by splitting their textual form
/// (`(a, b, c)`) on `", "` and pairing the pieces with the tuple components
/// positionally. Every other type is recorded verbatim.
///
/// Returns an empty mapping when the contract has no constructor or the
/// transaction carries no argument list. A length mismatch is fatal.
pub fn match_constructor_inputs(
    contract: &str,
    abi: Option<&ConstructorAbi>,
    arguments: Option<&[String]>,
) -> Result<ConstructorInputs, LedgerError> {
    let mut inputs = ConstructorInputs::new();
    let (Some(abi), Some(arguments)) = (abi, arguments) else {
        return Ok(inputs);
    };

    if abi.inputs.len() != arguments.len() {
        return Err(LedgerError::ConstructorArity {
            contract: contract.to_string(),
            expected: abi.inputs.len(),
            actual: arguments.len(),
        });
    }

    for (param, value) in abi.inputs.iter().zip(arguments) {
        let value = if param.is_tuple() {
            let inner = value.trim();
            let inner = inner.strip_prefix('(').unwrap_or(inner);
            let inner = inner.strip_suffix(')').unwrap_or(inner);
            let parts: IndexMap<String, String> = param
                .components
                .iter()
                .zip(inner.split(", "))
                .map(|(component, part)| (component.name.clone(), part.to_string()))
                .collect();
            ConstructorValue::Tuple(parts)
        } else {
            ConstructorValue::Scalar(value.clone())
        };
        inputs.insert(param.name.clone(), value);
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use chronicle_types::AbiParam;

    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn scalars_pass_through() {
        let abi = ConstructorAbi::new(vec![
            AbiParam::new("owner", "address"),
            AbiParam::new("cap", "uint256"),
        ]);
        let values = args(&["0xabc", "1000"]);
        let inputs = match_constructor_inputs("Token", Some(&abi), Some(&values)).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs["owner"], ConstructorValue::Scalar("0xabc".into()));
        assert_eq!(inputs["cap"], ConstructorValue::Scalar("1000".into()));
        let order: Vec<_> = inputs.keys().map(String::as_str).collect();
        assert_eq!(order, ["owner", "cap"]);
    }

    #[test]
    fn tuples_split_into_components() {
        let abi = ConstructorAbi::new(vec![AbiParam::tuple(
            "config",
            vec![
                AbiParam::new("fee", "uint256"),
                AbiParam::new("recipient", "address"),
            ],
        )]);
        let values = args(&["(500, 0xfeed)"]);
        let inputs = match_constructor_inputs("Pool", Some(&abi), Some(&values)).unwrap();
        let ConstructorValue::Tuple(parts) = &inputs["config"] else {
            panic!("expected tuple value");
        };
        assert_eq!(parts["fee"], "500");
        assert_eq!(parts["recipient"], "0xfeed");
    }

    #[test]
    fn short_tuple_leaves_trailing_components_out() {
        let abi = ConstructorAbi::new(vec![AbiParam::tuple(
            "config",
            vec![AbiParam::new("a", "uint8"), AbiParam::new("b", "uint8")],
        )]);
        let values = args(&["(1)"]);
        let inputs = match_constructor_inputs("Pool", Some(&abi), Some(&values)).unwrap();
        let ConstructorValue::Tuple(parts) = &inputs["config"] else {
            panic!("expected tuple value");
        };
        assert_eq!(parts.len(), 1);
        assert_eq!(parts["a"], "1");
    }

    #[test]
    fn arity_mismatch_is_fatal() {
        let abi = ConstructorAbi::new(vec![AbiParam::new("owner", "address")]);
        let values = args(&["0x1", "0x2"]);
        let err = match_constructor_inputs("Token", Some(&abi), Some(&values)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::ConstructorArity { expected: 1, actual: 2, .. }
        ));
    }

    #[test]
    fn missing_constructor_or_arguments_is_empty() {
        let abi = ConstructorAbi::new(vec![AbiParam::new("owner", "address")]);
        assert!(match_constructor_inputs("T", Some(&abi), None).unwrap().is_empty());
        let values = args(&["0x1"]);
        assert!(match_constructor_inputs("T", None, Some(&values)).unwrap().is_empty());
    }
}

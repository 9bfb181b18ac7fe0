use super::*;

#[test]
fn test_malformed_node_display() {
    let err = Error::MalformedNode {
        node: "e7".to_string(),
        kind: "MethodCall",
        reason: "static call carries a this argument".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Malformed MethodCall node e7: static call carries a this argument"
    );
}

#[test]
fn test_handle_overflow_display() {
    let err = Error::HandleOverflow("expressions");
    assert_eq!(
        err.to_string(),
        "Handle overflow: maximum number of expressions reached"
    );
}

#[test]
fn test_missing_normalizer_display() {
    let err = Error::MissingNormalizer {
        method: "m3".to_string(),
        service: "closure remover",
    };
    assert_eq!(err.to_string(), "Method m3 needs a closure remover before it can be converted");
}

#[test]
fn test_anyhow_conversion_is_transparent() {
    let err: Error = anyhow::anyhow!("converter exploded").into();
    assert!(matches!(err, Error::Other(_)));
    assert_eq!(err.to_string(), "converter exploded");
}

#[test]
fn test_result_alias() {
    fn fails() -> Result<u32> {
        Err(Error::DanglingHandle("s9".into()))
    }
    assert!(fails().is_err());
}

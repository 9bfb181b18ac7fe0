use super::*;

#[test]
fn test_zero_is_not_a_handle() {
    assert!(ExprId::new(0).is_none());
    assert_eq!(ExprId::new(3).map(|id| id.get()), Some(3));
}

#[test]
fn test_display_prefixes() {
    assert_eq!(ExprId::new(4).unwrap().to_string(), "e4");
    assert_eq!(StmtId::new(2).unwrap().to_string(), "s2");
    assert_eq!(PropertyId::new(9).unwrap().to_string(), "pr9");
}

#[test]
fn test_index_round_trip() {
    let id = LocalId::from_index(41).unwrap();
    assert_eq!(id.get(), 42);
    assert_eq!(id.index(), 41);
}

#[test]
fn test_defaults_are_dummies() {
    assert_eq!(ExprId::default(), ExprId::DUMMY);
    assert_eq!(StmtId::default(), StmtId::DUMMY_BLOCK);
    assert_eq!(TypeId::default(), TypeId::DUMMY);
    assert_eq!(MethodId::default(), MethodId::DUMMY);
}

#[test]
fn test_option_handle_is_niche_optimized() {
    assert_eq!(
        std::mem::size_of::<Option<ExprId>>(),
        std::mem::size_of::<ExprId>()
    );
}

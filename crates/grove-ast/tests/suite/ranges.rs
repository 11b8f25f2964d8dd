use proptest::prelude::*;

use crate::build;

fn atom() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::sample::select(vec!["a", "b", "c", "foo", "bar"]).prop_map(str::to_string),
        (0u32..1000).prop_map(|n| n.to_string()),
    ]
}

fn expression() -> impl Strategy<Value = String> {
    atom().prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec!["+", "-", "*", "==", "&&"]),
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("{l} {op} {r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            inner.clone().prop_map(|e| format!("({e}).size")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("a.foo({a}, {b})")),
            inner.clone().prop_map(|e| format!("a[{e}]")),
            prop::collection::vec(inner, 1..3).prop_map(|items| format!("[{}]", items.join(", "))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn statements_cover_their_expressions(expr in expression()) {
        let src = format!("x = {expr}\n");
        let result = build(&src);
        prop_assert!(result.diagnostics.is_empty(), "{src:?}: {:?}", result.diagnostics);

        let module = &result.module;
        prop_assert_eq!(module.statements.len(), 1);
        let stmt = module.statements[0];
        let outer = module.ast.node(stmt).range();
        prop_assert_eq!(outer.start, 0);

        for id in module.ast.descendants(stmt) {
            let node = module.ast.node(id);
            prop_assert!(node.pos.is_set(), "{src:?}: unset {:?}", node.kind);
            let range = node.range();
            prop_assert!(range.start <= range.end);
            prop_assert!(range.end <= src.len());
            prop_assert!(
                outer.covers(range),
                "{src:?}: {:?} at {:?} escapes {:?}",
                node.kind,
                range,
                outer
            );
        }
    }
}

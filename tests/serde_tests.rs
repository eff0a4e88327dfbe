#[cfg(feature = "serde")]
mod serde_tests {
    use tagtree::{
        Context, EvalError, IntValue, Node, ParseErrorKind, Pos, TagRegistry, TagtreeError,
        Template, TokenKind, Tree, lex,
    };

    #[test]
    fn test_token_kind_serialization() {
        let kind = TokenKind::Comparison;
        let serialized = serde_json::to_string(&kind).unwrap();
        assert_eq!(serialized, r#""Comparison""#);

        let deserialized: TokenKind = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, kind);
    }

    #[test]
    fn test_token_serialization() {
        let tokens: Vec<_> = lex("serde", "{% if 1 %}").collect();
        let serialized = serde_json::to_string(&tokens[1]).unwrap();
        assert_eq!(
            serialized,
            r#"{"kind":"If","pos":3,"text":"if","line":1,"column":4}"#
        );
    }

    #[test]
    fn test_node_serialization() {
        let node = Node::Int(IntValue {
            start: Pos(6),
            value: 42,
        });
        let serialized = serde_json::to_string(&node).unwrap();
        assert_eq!(serialized, r#"{"Int":{"start":6,"value":42}}"#);

        let deserialized: Node = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, node);
    }

    #[test]
    fn test_tree_nodes_roundtrip() {
        let mut tree = Tree::new("serde");
        tree.parse("a{% if 1 == \"1\" %}b{% elif 2 %}c{% else %}d{% endif %}")
            .unwrap();

        let serialized = serde_json::to_string(tree.root()).unwrap();
        let deserialized: Vec<Node> = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, tree.root());
    }

    #[test]
    fn test_error_serialization() {
        let mut tree = Tree::new("serde");
        let err = tree.parse("{% nope %}").unwrap_err();

        let serialized = serde_json::to_string(&err).unwrap();
        let deserialized: TagtreeError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, err);
        assert!(matches!(
            deserialized,
            TagtreeError::Parse(ref e) if e.kind == ParseErrorKind::UnknownTag { name: "nope".to_string() }
        ));

        let eval = TagtreeError::Eval(EvalError::TooManyParts { count: 4 });
        let serialized = serde_json::to_string(&eval).unwrap();
        assert_eq!(serialized, r#"{"Eval":{"TooManyParts":{"count":4}}}"#);
    }

    #[test]
    fn test_template_serialization() {
        let template = Template::new(
            "greeting",
            "Hello, {% if 7 == \"7\" %}World{% endif %}!",
            &TagRegistry::new(),
        )
        .unwrap();

        let serialized = serde_json::to_string(&template).unwrap();
        assert_eq!(
            serialized,
            r#"{"name":"greeting","source":"Hello, {% if 7 == \"7\" %}World{% endif %}!"}"#
        );

        // The tree is rebuilt from the source.
        let deserialized: Template = serde_json::from_str(&serialized).unwrap();
        let context = Context::new();
        assert_eq!(
            template.render(&context).unwrap(),
            deserialized.render(&context).unwrap()
        );
        assert_eq!(deserialized.render(&context).unwrap(), "Hello, World!");
        assert_eq!(deserialized.tree().root(), template.tree().root());
    }

    #[test]
    fn test_invalid_template_deserialization() {
        let result: Result<Template, _> =
            serde_json::from_str(r#"{"name":"bad","source":"{% if 1 %}"}"#);
        assert!(result.is_err());
    }
}

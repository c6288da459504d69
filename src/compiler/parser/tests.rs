use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::compiler::placeholder::Bind;

fn parse(input: &str) -> Program {
    Parser::new(input).parse().expect("parses")
}

fn parse_err(input: &str) -> SyntaxError {
    Parser::new(input).parse().expect_err("must fail")
}

fn text(node: &Node) -> &str {
    match node {
        Node::Text(text) => &text.sql,
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn test_plain_sql() {
    let program = parse("SELECT * FROM @@table WHERE id=@id");
    assert_eq!(program.nodes.len(), 1);
    assert_eq!(text(&program.nodes[0]), "SELECT * FROM ? WHERE id=?");
    assert_eq!(
        program.binds(),
        vec![&Bind::Table, &Bind::Value("id".into())]
    );
}

#[test]
fn test_if_else() {
    let program = parse("{{if x > 0}} a=@x {{else}} b=@y {{end}}");
    let [Node::If { branches, else_body }] = program.nodes.as_slice() else {
        panic!("expected a single if, got {:?}", program.nodes);
    };
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].condition, "x > 0");
    assert_eq!(text(&branches[0].body[0]), " a=? ");
    let else_body = else_body.as_ref().expect("else body");
    assert_eq!(text(&else_body[0]), " b=? ");
}

#[test]
fn test_else_if_chain() {
    let program = parse(
        "SELECT * FROM users\n  {{if user.ID > 0}}\n      WHERE id=@user.ID\n  {{else if user.Name != \"\"}}\n      WHERE name=@user.Name\n  {{end}}",
    );
    assert_eq!(program.nodes.len(), 2);
    assert_eq!(text(&program.nodes[0]), "SELECT * FROM users ");
    let Node::If { branches, else_body } = &program.nodes[1] else {
        panic!("expected if");
    };
    assert!(else_body.is_none());
    let conds: Vec<&str> = branches.iter().map(|b| b.condition.as_str()).collect();
    assert_eq!(conds, vec!["user.ID > 0", "user.Name != \"\""]);
    assert_eq!(text(&branches[0].body[0]), " WHERE id=? ");
    assert_eq!(text(&branches[1].body[0]), " WHERE name=? ");
}

#[test]
fn test_nested_where_for_if() {
    let program = parse(
        "{{where}}{{for _, v := range list}}{{if v.Ok}} k=@v.Val OR{{end}}{{end}}{{end}}",
    );
    let [Node::Clause { kind, body }] = program.nodes.as_slice() else {
        panic!("expected clause");
    };
    assert_eq!(*kind, ClauseKind::Where);
    let [Node::For { header, body }] = body.as_slice() else {
        panic!("expected for");
    };
    assert_eq!(header, "_, v := range list");
    let [Node::If { branches, .. }] = body.as_slice() else {
        panic!("expected if");
    };
    assert_eq!(branches[0].condition, "v.Ok");
    assert_eq!(text(&branches[0].body[0]), " k=? OR");
    assert!(program.has_loop());
}

#[test]
fn test_empty_clause_is_kept() {
    let program = parse("{{set}}{{end}}");
    assert_eq!(
        program.nodes,
        vec![Node::Clause {
            kind: ClauseKind::Set,
            body: Vec::new()
        }]
    );
}

#[test]
fn test_whitespace_between_directives_is_kept() {
    let program = parse("x=1{{if a}} AND a=@a{{end}} {{if b}}OR b=@b{{end}}");
    assert_eq!(program.nodes.len(), 4);
    assert_eq!(text(&program.nodes[2]), " ");
}

#[test]
fn test_indentation_before_directive_becomes_space() {
    let program = parse("  {{where}}   \n   {{end}}  ");
    let [Node::Text(before), Node::Clause { body, .. }, Node::Text(after)] =
        program.nodes.as_slice()
    else {
        panic!("expected text, clause, text; got {:?}", program.nodes);
    };
    assert_eq!(before.sql, "  ");
    assert_eq!(after.sql, "  ");
    // The line break is absorbed by the trailing spaces of line 1.
    assert_eq!(body.iter().map(text).collect::<Vec<_>>(), vec!["   "]);
}

#[test]
fn test_line_starting_with_directive_is_separated() {
    let program = parse("{{if a}}a=@a{{end}}\n{{if b}}AND b=@b{{end}}");
    let kinds: Vec<bool> = program
        .nodes
        .iter()
        .map(|n| matches!(n, Node::Text(_)))
        .collect();
    assert_eq!(kinds, vec![false, true, false]);
    assert_eq!(text(&program.nodes[1]), " ");
}

#[test]
fn test_continuation_lines_are_joined() {
    let program = parse("SELECT *\n    FROM t\nWHERE a = 1  ");
    let sql: Vec<&str> = program.nodes.iter().map(text).collect();
    assert_eq!(sql, vec!["SELECT * FROM t WHERE a = 1  "]);
}

#[test]
fn test_blank_lines_collapse() {
    let program = parse("SELECT 1\n\n\n   FROM t\n");
    assert_eq!(text(&program.nodes[0]), "SELECT 1 FROM t ");
}

#[test]
fn test_merged_text_keeps_bind_order() {
    let program = parse("a=@a\n  AND b=@b");
    assert_eq!(program.nodes.len(), 1);
    assert_eq!(text(&program.nodes[0]), "a=? AND b=?");
    assert_eq!(
        program.binds(),
        vec![&Bind::Value("a".into()), &Bind::Value("b".into())]
    );
}

#[test]
fn test_bind_order_is_depth_first() {
    let program = parse(
        "@a {{if c}} @b {{for x in xs}} @c {{end}} {{else if d}} @d {{else}} @e {{end}} @f",
    );
    let names: Vec<String> = program.binds().iter().map(|b| b.to_string()).collect();
    assert_eq!(names, vec!["@a", "@b", "@c", "@d", "@e", "@f"]);
}

#[test]
fn test_content_after_else_if_attaches_to_new_branch() {
    let program = parse("{{if a}}1{{else if b}}2{{else if c}}3{{else}}4{{end}}");
    let Node::If { branches, else_body } = &program.nodes[0] else {
        panic!("expected if");
    };
    let bodies: Vec<&str> = branches.iter().map(|b| text(&b.body[0])).collect();
    assert_eq!(bodies, vec!["1", "2", "3"]);
    assert_eq!(text(&else_body.as_ref().expect("else")[0]), "4");
}

#[rstest]
#[case("{{else}}", SyntaxErrorKind::ElseWithoutIf, 1)]
#[case("{{where}}\n{{else}}\n{{end}}", SyntaxErrorKind::ElseWithoutIf, 2)]
#[case("{{else if x}}", SyntaxErrorKind::ElseIfWithoutIf, 1)]
#[case("{{for x in y}}{{else if x}}{{end}}", SyntaxErrorKind::ElseIfWithoutIf, 1)]
#[case("{{if a}}\n{{else}}\n{{else}}\n{{end}}", SyntaxErrorKind::DuplicateElse, 3)]
#[case("{{if a}}{{else}}\n{{else if b}}{{end}}", SyntaxErrorKind::ElseIfAfterElse, 2)]
#[case("SELECT 1 {{end}}", SyntaxErrorKind::UnmatchedEnd, 1)]
#[case("{{where}}{{end}}\n{{end}}", SyntaxErrorKind::UnmatchedEnd, 2)]
#[case("{{where}}\n{{if a}}", SyntaxErrorKind::UnclosedBlock, 1)]
#[case("{{order by}}", SyntaxErrorKind::UnknownDirective, 1)]
#[case("{{If a}}{{end}}", SyntaxErrorKind::UnknownDirective, 1)]
#[case("{{if}}{{end}}", SyntaxErrorKind::UnknownDirective, 1)]
#[case("{{for}}{{end}}", SyntaxErrorKind::UnknownDirective, 1)]
#[case("{{else x}}", SyntaxErrorKind::UnknownDirective, 1)]
#[case("a\nb {{if x", SyntaxErrorKind::UnterminatedDirective, 2)]
fn test_syntax_errors(#[case] input: &str, #[case] kind: SyntaxErrorKind, #[case] line: usize) {
    let err = parse_err(input);
    assert_eq!(err.kind, kind);
    assert_eq!(err.line, line);
}

#[test]
fn test_unclosed_block_names_outermost() {
    let err = parse_err("SELECT\n{{for x in xs}}\n{{if a}}\n");
    assert_eq!(err.block, Some(BlockKind::For));
    assert_eq!(err.line, 2);
    assert_eq!(
        err.to_string(),
        "line 2: unclosed `for` block at end of template"
    );
}

#[test]
fn test_unknown_directive_message() {
    let err = parse_err("x\n  {{order by}}");
    assert_eq!(err.to_string(), "line 2: unknown directive {{order by}}");
    assert_eq!(err.column, 3);
}

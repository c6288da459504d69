//! Golden tests for the Go back end, using the templates of the example
//! query interface.

use pretty_assertions::assert_eq;

use super::Template;
use super::codegen::CodegenConfig;
use super::codegen::go::MethodShape;
use crate::doc::extract_sql;

fn compile_doc(comment: &str, method: &str) -> Template {
    let doc = extract_sql(comment, method);
    let sql = doc.template().expect("comment holds a template");
    Template::compile(sql).expect("template compiles")
}

fn go_lines(template: &Template) -> Vec<String> {
    template
        .to_go()
        .lines()
        .into_iter()
        .map(str::to_string)
        .collect()
}

const WHERE_TRIM: &str =
    r"reTrim := regexp.MustCompile(`(?i)^\s*(?:and|or)(?:\s+|$)|\s+(?:and|or)\s*$`)";

// ==================== GetByID ====================
#[test]
fn test_get_by_id() {
    let template = compile_doc(
        "GetByID query data by id and return it as struct\n\nSELECT * FROM @@table WHERE id=@id AND name = \"\\@name\"\n",
        "GetByID",
    );

    assert_eq!(
        template.to_go().body,
        "var sb strings.Builder\n\
         params := make([]any, 0, 2)\n\
         \n\
         sb.WriteString(\"SELECT * FROM ? WHERE id=? AND name = \\\"@name\\\"\")\n\
         params = append(params, clause.Table{Name: clause.CurrentTable}, id)\n"
    );
    assert_eq!(
        template.to_go().imports().collect::<Vec<_>>(),
        vec!["gorm.io/gorm/clause", "strings"]
    );
}

// ==================== FilterWithColumn ====================
#[test]
fn test_filter_with_column() {
    let template = compile_doc(
        "SELECT * FROM @@table WHERE @@column=@value",
        "FilterWithColumn",
    );

    assert_eq!(
        go_lines(&template),
        vec![
            "var sb strings.Builder",
            "params := make([]any, 0, 3)",
            r#"sb.WriteString("SELECT * FROM ? WHERE ?=?")"#,
            "params = append(params, clause.Table{Name: clause.CurrentTable}, gorm.Expr(column), value)",
        ]
    );
    assert!(template.to_go().imports().any(|i| i == "gorm.io/gorm"));
}

// ==================== QueryWith ====================
#[test]
fn test_query_with() {
    let template = compile_doc(
        "SELECT * FROM users\n  {{if user.ID > 0}}\n      WHERE id=@user.ID\n  {{else if user.Name != \"\"}}\n      WHERE name=@user.Name\n  {{end}}",
        "QueryWith",
    );

    assert_eq!(
        go_lines(&template),
        vec![
            "var sb strings.Builder",
            "params := make([]any, 0, 2)",
            r#"sb.WriteString("SELECT * FROM users ")"#,
            "if user.ID > 0 {",
            r#"sb.WriteString(" WHERE id=? ")"#,
            "params = append(params, user.ID)",
            r#"} else if user.Name != "" {"#,
            r#"sb.WriteString(" WHERE name=? ")"#,
            "params = append(params, user.Name)",
            "}",
        ]
    );
}

#[test]
fn test_branches_are_tab_indented() {
    let template = Template::compile("{{if a}}{{for _, x := range xs}}@x{{end}}{{end}}")
        .expect("template compiles");
    let body = template.to_go().body;
    assert!(body.ends_with(
        "\nif a {\n\tfor _, x := range xs {\n\t\tsb.WriteString(\"?\")\n\t\tparams = append(params, x)\n\t}\n}\n"
    ));
}

// ==================== UpdateInfo ====================
#[test]
fn test_update_info() {
    let template = compile_doc(
        "UPDATE @@table\n {{set}}\n   {{if user.Name != \"\"}} name=@user.Name, {{end}}\n   {{if user.Age > 0}} age=@user.Age, {{end}}\n   {{if user.Age >= 18}} is_adult=1 {{else}} is_adult=0 {{end}}\n {{end}}\nWHERE id=@id",
        "UpdateInfo",
    );

    assert_eq!(
        go_lines(&template),
        vec![
            "var sb strings.Builder",
            "params := make([]any, 0, 4)",
            r#"sb.WriteString("UPDATE ? ")"#,
            "params = append(params, clause.Table{Name: clause.CurrentTable})",
            "{",
            "var tmp strings.Builder",
            "var tmpParams []any",
            r#"tmp.WriteString(" ")"#,
            r#"if user.Name != "" {"#,
            r#"tmp.WriteString(" name=?, ")"#,
            "tmpParams = append(tmpParams, user.Name)",
            "}",
            r#"tmp.WriteString(" ")"#,
            "if user.Age > 0 {",
            r#"tmp.WriteString(" age=?, ")"#,
            "tmpParams = append(tmpParams, user.Age)",
            "}",
            r#"tmp.WriteString(" ")"#,
            "if user.Age >= 18 {",
            r#"tmp.WriteString(" is_adult=1 ")"#,
            "} else {",
            r#"tmp.WriteString(" is_adult=0 ")"#,
            "}",
            r#"tmp.WriteString(" ")"#,
            "c := strings.TrimSpace(tmp.String())",
            r#"c = strings.TrimSpace(strings.TrimSuffix(c, ","))"#,
            r#"if c != "" {"#,
            "if n := sb.Len(); n > 0 && !unicode.IsSpace(rune(sb.String()[n-1])) {",
            r#"sb.WriteString(" ")"#,
            "}",
            r#"sb.WriteString("SET ")"#,
            "sb.WriteString(c)",
            "params = append(params, tmpParams...)",
            "}",
            "}",
            r#"sb.WriteString(" WHERE id=?")"#,
            "params = append(params, id)",
        ]
    );
    assert!(!template.to_go().imports().any(|i| i == "regexp"));
}

// ==================== Filter ====================
#[test]
fn test_filter() {
    let template = compile_doc(
        "SELECT * FROM @@table\n{{where}}\n  {{for _, user := range users}}\n    {{if user.Name != \"\" && user.Age > 0}}\n      (name = @user.Name AND age=@user.Age AND role LIKE concat(\"%\",@user.Role,\"%\")) OR\n    {{end}}\n  {{end}}\n{{end}}",
        "Filter",
    );

    assert_eq!(
        go_lines(&template),
        vec![
            "var sb strings.Builder",
            "params := make([]any, 0, 13)",
            r#"sb.WriteString("SELECT * FROM ? ")"#,
            "params = append(params, clause.Table{Name: clause.CurrentTable})",
            "{",
            "var tmp strings.Builder",
            "var tmpParams []any",
            r#"tmp.WriteString(" ")"#,
            "for _, user := range users {",
            r#"tmp.WriteString(" ")"#,
            r#"if user.Name != "" && user.Age > 0 {"#,
            r#"tmp.WriteString(" (name = ? AND age=? AND role LIKE concat(\"%\",?,\"%\")) OR ")"#,
            "tmpParams = append(tmpParams, user.Name, user.Age, user.Role)",
            "}",
            r#"tmp.WriteString(" ")"#,
            "}",
            r#"tmp.WriteString(" ")"#,
            "c := strings.TrimSpace(tmp.String())",
            WHERE_TRIM,
            r#"c = strings.TrimSpace(reTrim.ReplaceAllString(c, ""))"#,
            r#"if c != "" {"#,
            "if n := sb.Len(); n > 0 && !unicode.IsSpace(rune(sb.String()[n-1])) {",
            r#"sb.WriteString(" ")"#,
            "}",
            r#"sb.WriteString("WHERE ")"#,
            "sb.WriteString(c)",
            "params = append(params, tmpParams...)",
            "}",
            "}",
        ]
    );
    assert_eq!(
        template.to_go().imports().collect::<Vec<_>>(),
        vec!["gorm.io/gorm/clause", "regexp", "strings", "unicode"]
    );
}

// ==================== FilterByNameAndAge ====================
#[test]
fn test_filter_by_name_and_age_where_method() {
    let template = compile_doc(r#"where("name=@name AND age=@age")"#, "FilterByNameAndAge");
    let method = template.to_go_method(&MethodShape::Where);

    assert_eq!(
        method.lines(),
        vec![
            "var sb strings.Builder",
            "params := make([]any, 0, 2)",
            r#"sb.WriteString("name=? AND age=?")"#,
            "params = append(params, name, age)",
            "e.Where(clause.Expr{SQL: sb.String(), Vars: params})",
            "return e",
        ]
    );
    assert!(method.imports().any(|i| i == "gorm.io/gorm/clause"));
}

// ==================== FilterWithTime ====================
#[test]
fn test_filter_with_time() {
    let template = compile_doc(
        "SELECT * FROM @@table\n {{where}}\n   {{if !start.IsZero()}}\n     created_at > @start\n   {{end}}\n   {{if !end.IsZero()}}\n     AND created_at < @end\n   {{end}}\n {{end}}",
        "FilterWithTime",
    );

    let lines = go_lines(&template);
    assert_eq!(lines[1], "params := make([]any, 0, 3)");
    assert!(lines.contains(&r#"tmp.WriteString(" created_at > ? ")"#.to_string()));
    assert!(lines.contains(&r#"tmp.WriteString(" AND created_at < ? ")"#.to_string()));
    assert!(lines.contains(&WHERE_TRIM.to_string()));
}

// ==================== Method shapes ====================
#[test]
fn test_exec_and_scan_methods() {
    let template = Template::compile("DELETE FROM @@table WHERE id=@id").expect("compiles");

    let exec = template.to_go_method(&MethodShape::Exec);
    assert!(exec.body.ends_with("\nreturn e.Exec(ctx, sb.String(), params...)\n"));

    let scan = template.to_go_method(&MethodShape::Scan {
        result_type: "[]T".into(),
    });
    assert!(scan.body.ends_with(
        "\nvar result []T\nerr := e.Raw(sb.String(), params...).Scan(ctx, &result)\nreturn result, err\n"
    ));
}

#[test]
fn test_select_method() {
    let template = Template::compile("id, @@col").expect("compiles");
    let select = template.to_go_method(&MethodShape::Select);
    assert_eq!(
        select.lines()[select.lines().len() - 2..],
        ["e.Select(sb.String(), params...)", "return e"]
    );
}

// ==================== Configuration ====================
#[test]
fn test_custom_variable_names() {
    let config = CodegenConfig::new()
        .buffer_var("query")
        .params_var("args")
        .scratch_var("part");
    let template =
        Template::compile_with("SELECT 1 {{where}}{{set}}a=@a,{{end}}{{end}}", config)
            .expect("compiles");
    let lines = go_lines(&template);

    assert_eq!(lines[0], "var query strings.Builder");
    assert_eq!(lines[1], "args := make([]any, 0, 1)");
    assert!(lines.contains(&"var part strings.Builder".to_string()));
    assert!(lines.contains(&"var part2 strings.Builder".to_string()));
    assert!(lines.contains(&"partParams2 = append(partParams2, a)".to_string()));
    assert!(lines.contains(&"partParams = append(partParams, partParams2...)".to_string()));
    assert!(lines.contains(&"args = append(args, partParams...)".to_string()));
}

#[test]
fn test_template_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Template>();
}

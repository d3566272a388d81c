use mandira::value::Value;
use mandira::{context, Environment, Error, ErrorKind, Template};

use similar_asserts::assert_eq;

#[test]
fn test_custom_filter() {
    let mut env = Environment::new();
    env.add_filter("repeat", |value: String, n: usize| value.repeat(n));
    env.add_filter("wrap", |value: String, left: String, right: Option<String>| {
        format!("{}{}{}", left, value, right.as_deref().unwrap_or(&left))
    });
    let rv = env
        .render_str(
            r#"{{word|repeat(3)}} {{word|wrap("*")}} {{word|wrap("<", ">")}}"#,
            context! { word => "ab" },
        )
        .unwrap();
    assert_eq!(rv, "ababab *ab* &lt;ab&gt;");
}

#[test]
fn test_fallible_filter() {
    fn half(value: i64) -> Result<i64, Error> {
        if value % 2 == 0 {
            Ok(value / 2)
        } else {
            Err(Error::new(ErrorKind::InvalidOperation, "odd number"))
        }
    }

    let mut env = Environment::new();
    env.add_filter("half", half);
    let tmpl = Template::new("[{{n|half}}]").unwrap();
    assert_eq!(env.render(&tmpl, &[context! { n => 8 }]), "[4]");
    assert_eq!(env.render(&tmpl, &[context! { n => 7 }]), "[]");
}

#[test]
fn test_arguments_resolve_at_render_time() {
    let mut env = Environment::new();
    env.add_filter("plus", |a: i64, b: i64| a + b);
    let tmpl = Template::new("{{#items}}{{.|plus(offset)}} {{/items}}").unwrap();
    let rv = env.render(
        &tmpl,
        &[context! { items => vec![1, 2], offset => 10 }],
    );
    assert_eq!(rv, "11 12 ");
    let rv = env.render(&tmpl, &[context! { items => vec![1], offset => 100 }]);
    assert_eq!(rv, "101 ");
}

#[test]
fn test_empty_environment() {
    let env = Environment::empty();
    let tmpl = Template::new("{{name}}|{{name|upper}}").unwrap();
    assert_eq!(env.render(&tmpl, &[context! { name => "x" }]), "x|");
}

#[test]
fn test_override_and_remove_builtin() {
    let mut env = Environment::new();
    env.add_filter("upper", |value: String| format!("UP:{}", value));
    assert_eq!(
        env.render_str("{{v|upper}}", context! { v => "a" }).unwrap(),
        "UP:a"
    );
    env.remove_filter("upper");
    assert_eq!(env.render_str("{{v|upper}}", context! { v => "a" }).unwrap(), "");
}

#[test]
fn test_filter_in_condition() {
    let mut env = Environment::new();
    env.add_filter("is_admin", |value: Value| value.as_str() == Some("root"));
    let tmpl = Template::new("{{?if user|is_admin}}admin{{?else}}user{{/if}}").unwrap();
    assert_eq!(env.render(&tmpl, &[context! { user => "root" }]), "admin");
    assert_eq!(env.render(&tmpl, &[context! { user => "bob" }]), "user");
}

#[test]
fn test_render_to_write() {
    let env = Environment::new();
    let tmpl = Template::new("{{#xs}}{{.}};{{/xs}}").unwrap();
    let mut buf = Vec::new();
    env.render_to_write(&tmpl, &[context! { xs => vec!["a", "b"] }], &mut buf)
        .unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), "a;b;");
}

#[test]
fn test_shared_across_threads() {
    let env = Environment::new();
    let tmpl = Template::new("{{n|divisibleby(2)}}").unwrap();
    std::thread::scope(|scope| {
        for n in 0..4 {
            let env = &env;
            let tmpl = &tmpl;
            scope.spawn(move || {
                let rv = env.render(tmpl, &[context! { n }]);
                assert_eq!(rv, if n % 2 == 0 { "true" } else { "false" });
            });
        }
    });
}

#[test]
fn test_debug() {
    let env = Environment::new();
    insta::assert_snapshot!(
        format!("{:?}", env),
        @r###"Environment { filters: ["divisibleby", "format", "index", "join", "len", "lower", "title", "upper"] }"###
    );
}

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use mandira::value::{Object, Value};
use mandira::{context, render, Error, ErrorKind, Template};
use serde::Serialize;

use similar_asserts::assert_eq;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Data {
    a: bool,
    b: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
struct User {
    name: String,
    id: i64,
}

#[derive(Debug)]
struct UserObject(User);

impl fmt::Display for UserObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

impl Object for UserObject {
    fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "Name" => Some(Value::from(self.0.name.clone())),
            "Id" => Some(Value::from(self.0.id)),
            _ => None,
        }
    }

    fn call_method(&self, name: &str) -> Result<Value, Error> {
        match name {
            "Func1" | "Func2" => Ok(Value::from(self.0.name.clone())),
            "Func3" => Ok(context! { name => self.0.name }),
            "Func4" => Ok(Value::from(())),
            "Func5" => Ok(context! { Allow => true }),
            "Func6" => Ok(Value::from(vec![context! { Allow => true }])),
            "Truefunc1" | "Truefunc2" => Ok(Value::from(true)),
            "Broken" => Err(Error::new(ErrorKind::InvalidOperation, "broken")),
            _ => Err(Error::from(ErrorKind::UnknownMethod)),
        }
    }
}

fn mike() -> Value {
    Value::from_object(UserObject(User {
        name: "Mike".into(),
        id: 1,
    }))
}

fn check<S: Serialize>(source: &str, ctx: S, expected: &str) {
    let rv = render(source, ctx).unwrap();
    assert_eq!(rv, expected, "template: {:?}", source);
}

#[test]
fn test_basics() {
    check("Hello, World", (), "Hello, World");
    check("Hello, {{name}}", context! { name => "World" }, "Hello, World");
    check(
        "{{a}}{{b}}{{c}}{{d}}",
        context! { a => "a", b => "b", c => "c", d => "d" },
        "abcd",
    );
    check(
        "0{{a}}1{{b}}23{{c}}456{{d}}89",
        context! { a => "a", b => "b", c => "c", d => "d" },
        "0a1b23c456d89",
    );
    check("hello {{! comment }}world", context! {}, "hello world");
}

#[test]
fn test_escaping() {
    check("{{var}}", context! { var => "5 > 2" }, "5 &gt; 2");
    check("{{{var}}}", context! { var => "5 > 2" }, "5 > 2");
    check("{{{ var }}}", context! { var => "5 > 2" }, "5 > 2");
    check(
        "{{var}}",
        context! { var => r#"<a href="x">Tom & Jerry's</a>"# },
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;",
    );
}

#[test]
fn test_missing_names() {
    check("{{dne}}", context! { name => "world" }, "");
    check("{{dne}}", mike(), "");
    check("{{#has}}hi{{/has}}", mike(), "");
    check("a{{dne|upper}}b{{dne}}c", (), "abc");
    check("{{?if dne}}yes{{?else}}no{{/if}}", (), "no");
}

#[test]
fn test_sections() {
    let hello = Data {
        a: true,
        b: "hello".into(),
    };
    check("{{#A}}{{B}}{{/A}}", &hello, "hello");
    check(
        "{{#A}}{{{B}}}{{/A}}",
        Data {
            a: true,
            b: "5 > 2".into(),
        },
        "5 > 2",
    );
    check(
        "{{#A}}{{B}}{{/A}}",
        Data {
            a: true,
            b: "5 > 2".into(),
        },
        "5 &gt; 2",
    );
    check(
        "{{#A}}{{B}}{{/A}}",
        Data {
            a: false,
            b: "hello".into(),
        },
        "",
    );
    check(
        "{{a}}{{#b}}{{b}}{{/b}}{{c}}",
        context! { a => "a", b => "b", c => "c" },
        "abc",
    );
    check(
        "{{#A}}{{B}}{{/A}}",
        context! { A => vec![context! { B => "a" }, context! { B => "b" }, context! { B => "c" }] },
        "abc",
    );
    let users = vec![User {
        name: "Mike".into(),
        id: 1,
    }];
    check("{{#users}}{{Name}}{{/users}}", context! { users }, "Mike");
    check("{{Name}}", &users[0], "Mike");
}

#[test]
fn test_section_falsiness() {
    for value in [
        Value::from(false),
        Value::from(()),
        Value::from(""),
        Value::from(Vec::<i32>::new()),
    ] {
        check("{{#a}}x{{/a}}", context! { a => value }, "");
    }
    check("{{#a}}x{{/a}}", context! { a => 0 }, "x");
    check("{{#a}}x{{/a}}", context! { a => context! {} }, "x");
}

#[test]
fn test_section_newlines() {
    let users = vec![mike(), mike()];
    check(
        "{{#users}}\n{{Name}}\n{{/users}}",
        context! { users => users.clone() },
        "Mike\nMike\n",
    );
    check(
        "{{#users}}\r\n{{Name}}\r\n{{/users}}",
        context! { users },
        "Mike\r\nMike\r\n",
    );
}

#[test]
fn test_sequence_iteration() {
    let users = vec![
        context! { Name => "Ann" },
        context! { Name => "Bob" },
        context! { Name => "Cid" },
    ];
    let rv = render("{{#users}}{{.index1}}:{{Name}}\n{{/users}}", context! { users }).unwrap();
    insta::assert_snapshot!(rv, @r###"
    1:Ann
    2:Bob
    3:Cid
    "###);

    check(
        "{{#items}}[{{.index}}={{.}}]{{/items}}",
        context! { items => vec!["x", "y"] },
        "[0=x][1=y]",
    );
    check("{{.index}}{{.index1}}", context! {}, "");
}

#[test]
fn test_methods() {
    let users = || Value::from(vec![mike()]);
    check("{{#users}}{{Func1}}{{/users}}", context! { users => users() }, "Mike");
    check("{{#users}}{{Func2}}{{/users}}", context! { users => users() }, "Mike");
    check(
        "{{#users}}{{#Func3}}{{name}}{{/Func3}}{{/users}}",
        context! { users => users() },
        "Mike",
    );
    check(
        "{{#users}}{{#Func4}}{{name}}{{/Func4}}{{/users}}",
        context! { users => users() },
        "",
    );
    check("{{#Truefunc1}}abcd{{/Truefunc1}}", mike(), "abcd");
    check("{{#Truefunc2}}abcd{{/Truefunc2}}", mike(), "abcd");
    check("{{#Func5}}{{#Allow}}abcd{{/Allow}}{{/Func5}}", mike(), "abcd");
    check(
        "{{#user}}{{#Func5}}{{#Allow}}abcd{{/Allow}}{{/Func5}}{{/user}}",
        context! { user => mike() },
        "abcd",
    );
    check(
        "{{#user}}{{#Func6}}{{#Allow}}abcd{{/Allow}}{{/Func6}}{{/user}}",
        context! { user => mike() },
        "abcd",
    );
    // a failing method resolves to nothing instead of falling through
    check(
        "[{{#user}}{{Broken}}{{/user}}]",
        context! { user => mike(), Broken => "outer" },
        "[]",
    );
}

#[test]
fn test_context_chaining() {
    check(
        "hello {{#section}}{{name}}{{/section}}",
        context! { section => context! { name => "world" } },
        "hello world",
    );
    check(
        "hello {{#section}}{{name}}{{/section}}",
        context! { name => "bob", section => context! { name => "world" } },
        "hello world",
    );
    check(
        "hello {{#bool}}{{#section}}{{name}}{{/section}}{{/bool}}",
        context! { bool => true, section => context! { name => "world" } },
        "hello world",
    );
    check(
        "{{#users}}{{canvas}}{{/users}}",
        context! { canvas => "hello", users => vec![mike()] },
        "hello",
    );

    #[derive(Debug)]
    struct Category {
        tag: &'static str,
        description: &'static str,
    }

    impl fmt::Display for Category {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.tag)
        }
    }

    impl Object for Category {
        fn call_method(&self, name: &str) -> Result<Value, Error> {
            match name {
                "DisplayName" => Ok(Value::from(format!("{} - {}", self.tag, self.description))),
                _ => Err(Error::from(ErrorKind::UnknownMethod)),
            }
        }
    }

    let mut ctx = BTreeMap::new();
    ctx.insert(
        "categories",
        vec![Value::from_arc_object(Arc::new(Category {
            tag: "a",
            description: "b",
        }))],
    );
    check("{{#categories}}{{DisplayName}}{{/categories}}", ctx, "a - b");
}

#[test]
fn test_explicit_chain() {
    let env = mandira::Environment::new();
    let tmpl = Template::new("{{a}}-{{b}}").unwrap();
    let rv = env.render(
        &tmpl,
        &[context! { a => "inner" }, context! { a => "outer", b => "outer" }],
    );
    assert_eq!(rv, "inner-outer");
    assert_eq!(env.render(&tmpl, &[]), "-");
}

#[test]
fn test_sample() {
    let source = "Hello {{name}}\nYou have just won ${{value}}!\n{{?if in_monaco}}\nWell, ${{taxed_value}}, after taxes.\n{{/if}}";
    let rv = render(
        source,
        context! {
            name => "Jason",
            value => 10000,
            taxed_value => 10000.0,
            in_monaco => true,
        },
    )
    .unwrap();
    assert_eq!(
        rv,
        "Hello Jason\nYou have just won $10000!\n\nWell, $10000, after taxes.\n"
    );

    let rv = render(
        source,
        context! {
            name => "Jason",
            value => 10000,
            taxed_value => 10000.0,
            in_monaco => false,
        },
    )
    .unwrap();
    assert_eq!(rv, "Hello Jason\nYou have just won $10000!\n");
}

#[test]
fn test_filters() {
    let names = vec!["john", "bob", "fred"];
    check("{{name}}", context! { name => "Jason" }, "Jason");
    check("{{name|upper}}", context! { name => "jason" }, "JASON");
    check("{{name|len}}", context! { name => "jason" }, "5");
    check("{{name|index(3)}}", context! { name => "jason" }, "o");
    check("{{name|index(0)}}", context! { name => names }, "john");
    check("{{name|index(0)|upper}}", context! { name => names }, "JOHN");
    check("{{name|index(1)|title}}", context! { name => names }, "Bob");
    check("{{name|index(5)}}", context! { name => names }, "");
    check("{{name|index(5)|title}}", context! { name => names }, "");
    check("{{name|index(5)|upper}}", context! { name => names }, "");
    check(
        r#"{{name|format(">%s<")}}"#,
        context! { name => "jason" },
        "&gt;jason&lt;",
    );
    check(
        r#"{{{name|format(">%s<")}}}"#,
        context! { name => "jason" },
        ">jason<",
    );
    check(
        r#"{{names|join(", ")}}"#,
        context! { names },
        "john, bob, fred",
    );
    check("{{names|len|divisibleby(2)}}", context! { names }, "false");
    check("{{names|len|divisibleby(3)}}", context! { names }, "true");
    check(
        "{{names|join(joiner)}}",
        context! { names, joiner => ", " },
        "john, bob, fred",
    );
    check("{{price|format(\"%.2f\")}}", context! { price => 3.14159 }, "3.14");
    check("{{name|lower}}", context! { name => "JaSoN" }, "jason");
}

#[test]
fn test_filter_failures_blank_the_expression() {
    check("[{{name|nope}}]", context! { name => "x" }, "[]");
    check("[{{n|divisibleby(0)}}]", context! { n => 4 }, "[]");
    check("[{{n|divisibleby}}]", context! { n => 4 }, "[]");
    check("[{{n|divisibleby(2, 3)}}]", context! { n => 4 }, "[]");
    check("[{{n|divisibleby(\"x\")}}]", context! { n => 4 }, "[]");
    check("[{{n|format(\"%d\")}}]", context! { n => "x" }, "[]");
}

#[test]
fn test_if_blocks() {
    for value in [
        Value::from(true),
        Value::from("hi"),
        Value::from(1),
        Value::from(vec!["hi"]),
        Value::from(0),
        Value::from(Vec::<i32>::new()),
    ] {
        check("{{?if name}}Hello{{/if}}", context! { name => value }, "Hello");
    }
    for value in [Value::from(false), Value::from(""), Value::from(())] {
        check("{{?if name}}Hello{{/if}}", context! { name => value }, "");
    }
    check("{{?if name|len > 4}}True{{/if}}", context! { name => "alex" }, "");
    check(
        "{{?if name|len > 4}}True{{/if}}",
        context! { name => "alexander" },
        "True",
    );
    check("{{?if age|divisibleby(2)}}True{{/if}}", context! { age => 30 }, "True");
    check("{{?if age|divisibleby(2)}}True{{/if}}", context! { age => 31 }, "");

    let simple = r#"{{?if name == "john"}}Yes!{{?else}}No!{{/if}}"#;
    check(simple, context! { name => "ted" }, "No!");
    check(simple, context! { name => "john" }, "Yes!");

    let either = r#"{{?if name == "john" or name == "ted"}}Yes!{{?else}}No!{{/if}}"#;
    check(either, context! { name => "john" }, "Yes!");
    check(either, context! { name => "ted" }, "Yes!");
    check(either, context! { name => "fred" }, "No!");
}

#[test]
fn test_conditions() {
    let ctx = || context! { a => true, b => false, n => 5, s => "x" };
    check("{{?if not b}}yes{{/if}}", ctx(), "yes");
    check("{{?if not not a}}yes{{/if}}", ctx(), "yes");
    check("{{?if a and b}}yes{{?else}}no{{/if}}", ctx(), "no");
    check("{{?if b or a}}yes{{/if}}", ctx(), "yes");
    check("{{?if not (a and b)}}yes{{/if}}", ctx(), "yes");
    check("{{?if (b or a) and n >= 5}}yes{{/if}}", ctx(), "yes");
    // strictly left to right: (a or b) and b
    check("{{?if a or b and b}}yes{{?else}}no{{/if}}", ctx(), "no");
    check("{{?if n < 10 and n > 1}}yes{{/if}}", ctx(), "yes");
    check("{{?if n == 5.0}}yes{{/if}}", ctx(), "yes");
    check("{{?if n != 5}}yes{{?else}}no{{/if}}", ctx(), "no");
    // mismatched kinds compare as false
    check("{{?if s > 1}}yes{{?else}}no{{/if}}", ctx(), "no");
    check("{{?if missing == 1}}yes{{?else}}no{{/if}}", ctx(), "no");
    check("{{?if missing != 1}}yes{{?else}}no{{/if}}", ctx(), "no");
    check("{{?if \"a\" < \"b\"}}yes{{/if}}", ctx(), "yes");
}

#[test]
fn test_nested_sections() {
    let ctx = context! {
        groups => vec![
            context! { title => "A", items => vec![1, 2] },
            context! { title => "B", items => Vec::<i32>::new() },
        ]
    };
    let rv = render(
        "{{#groups}}{{title}}:{{#items}}{{.}}{{?if .index1 < 2}},{{/if}}{{/items}};{{/groups}}",
        ctx,
    )
    .unwrap();
    assert_eq!(rv, "A:1,2;B:;");
}

#[test]
fn test_idempotence() {
    let tmpl = Template::new("{{#xs}}{{.}}{{/xs}} {{name|upper}}").unwrap();
    let ctx = context! { xs => vec![1, 2, 3], name => "x" };
    let first = tmpl.render(&ctx);
    let second = tmpl.render(&ctx);
    assert_eq!(first, "123 X");
    assert_eq!(first, second);
}

#[test]
fn test_layout() {
    let rv = mandira::render_in_layout(
        "<p>{{msg}}</p>",
        "<body>{{{content}}}|{{content}}|{{msg}}</body>",
        context! { msg => "hi" },
    )
    .unwrap();
    assert_eq!(
        rv,
        "<body><p>hi</p>|&lt;p&gt;hi&lt;/p&gt;|hi</body>"
    );
}

#[test]
fn test_callables() {
    let ctx = context! {
        greeting => Value::from_function(|| "hi"),
    };
    check("{{greeting|upper}}", ctx, "HI");
}

#[test]
fn test_parse_errors() {
    let err = Template::new("{{#a}}\n{{#b}}{{/a}}{{/b}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseError);
    insta::assert_snapshot!(err.to_string(), @"parse error: interleaved closing tag: a (line 2)");

    let err = Template::new("{{name|}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);

    let err = Template::new("{{?if a = b}}x{{/if}}").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SyntaxError);

    assert!(render("{{#a}}", ()).is_err());
    assert!(render("{{a", ()).is_err());
}

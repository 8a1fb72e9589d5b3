//! A generic value-to-XML serializer for the API's `.xml` format.
//!
//! Object keys become child elements, array items repeat the element name
//! they sit under, and `null` values are left out.

use serde_json::Value;

pub fn to_xml(root: &str, value: &Value) -> String {
    let mut out = String::from("<?xml version='1.0'?>\n");
    write_element(&mut out, root, value);
    out
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                write_element(out, name, item);
            }
        }
        Value::Object(fields) => {
            out.push_str(&format!("<{name}>"));
            for (key, field) in fields {
                write_element(out, key, field);
            }
            out.push_str(&format!("</{name}>"));
        }
        Value::String(text) => {
            out.push_str(&format!("<{name}>{}</{name}>", escape(text)));
        }
        Value::Bool(b) => out.push_str(&format!("<{name}>{b}</{name}>")),
        Value::Number(n) => out.push_str(&format!("<{name}>{n}</{name}>")),
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn arrays_repeat_their_element_and_nulls_vanish() {
        let value = json!({
            "quiz": [
                {"id": 1, "question": "Capital of Italy", "attachment": null},
                {"id": 2, "question": "Capital of France", "favourite": true},
            ]
        });

        assert_eq!(
            to_xml("quizzes", &value),
            "<?xml version='1.0'?>\n<quizzes>\
             <quiz><id>1</id><question>Capital of Italy</question></quiz>\
             <quiz><favourite>true</favourite><id>2</id><question>Capital of France</question></quiz>\
             </quizzes>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let xml = to_xml("answer", &json!("<b>Tom & \"Jerry\"</b>"));
        assert!(xml.ends_with("<answer>&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;</answer>"));
    }

    #[test]
    fn nested_objects_become_child_elements() {
        let xml = to_xml("quiz", &json!({"author": {"username": "pepe", "photo": null}}));
        assert!(xml.ends_with("<quiz><author><username>pepe</username></author></quiz>"));
    }
}

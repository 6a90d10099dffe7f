//! Property tests for the S2K reader.

use std::collections::BTreeMap;

use ofem_s2k::{RowValues, S2kReader, TableSet};
use proptest::prelude::*;
use proptest::sample::Index;

fn key() -> impl Strategy<Value = String> {
    "K[a-z0-9]{0,6}"
}

fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9.+-]{1,8}",
        "[A-Za-z0-9]{1,5}( [A-Za-z0-9]{1,5}){1,3}",
        Just(String::new()),
    ]
}

fn row() -> impl Strategy<Value = RowValues> {
    prop::collection::btree_map(key(), value(), 1..6)
        .prop_map(|m: BTreeMap<String, String>| m.into_iter().collect())
}

fn table_set() -> impl Strategy<Value = TableSet> {
    prop::collection::btree_map(
        "[A-Z]{1,6}( - [A-Z]{1,6})?",
        prop::collection::vec(row(), 1..5),
        1..4,
    )
    .prop_map(|tables| {
        let mut set = TableSet::new();
        for (name, rows) in tables {
            let table = set.open(&name);
            for values in rows {
                table.push_row(values);
            }
        }
        set
    })
}

fn words(values: &RowValues) -> Vec<String> {
    let mut out = Vec::new();
    for (k, v) in values {
        if v.is_empty() {
            out.push(format!("{k}=\"\""));
        } else if v.contains(' ') {
            let parts: Vec<&str> = v.split(' ').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                match i {
                    0 => out.push(format!("{k}=\"{part}")),
                    i if i == last => out.push(format!("{part}\"")),
                    _ => out.push(part.to_string()),
                }
            }
        } else {
            out.push(format!("{k}={v}"));
        }
    }
    out
}

proptest! {
    #[test]
    fn serialized_tables_parse_back_identically(set in table_set()) {
        let text = set.to_s2k_string();
        let parsed = S2kReader::parse_str(&text).expect("serialized text parses");
        prop_assert_eq!(parsed, set);
    }

    #[test]
    fn split_line_parses_like_unsplit(values in row(), split in any::<Index>()) {
        let words = words(&values);
        prop_assume!(words.len() >= 2);
        let at = 1 + split.index(words.len() - 1);

        let whole = format!("TABLE:  \"T\"\n   {}\n", words.join("   "));
        let split_doc = format!(
            "TABLE:  \"T\"\n   {} _\n      {}\n",
            words[..at].join("   "),
            words[at..].join("   "),
        );

        let a = S2kReader::parse_str(&whole).expect("unsplit parses");
        let b = S2kReader::parse_str(&split_doc).expect("split parses");
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.get("T").map(|t| t.len()), Some(1));
    }
}

//! Joint and element tag assignment over generated S2K documents.

use std::collections::BTreeSet;

use ofem_model::{ElementShape, ModelDefaults, StructuralModel};
use ofem_s2k::S2kReader;
use proptest::prelude::*;

fn document(labels: &[String], quads: &[bool]) -> String {
    let mut src = String::from("TABLE:  \"JOINT COORDINATES\"\n");
    for (i, label) in labels.iter().enumerate() {
        src.push_str(&format!("   Joint={label}   XorR={i}   Y=0   Z=0\n"));
    }
    src.push_str("TABLE:  \"CONNECTIVITY - AREA\"\n");
    let n = labels.len();
    for (i, quad) in quads.iter().enumerate() {
        let j = |k: usize| &labels[(i + k) % n];
        let fourth = if *quad { j(3).as_str() } else { "nan" };
        src.push_str(&format!(
            "   Area=A{i}   Joint1={}   Joint2={}   Joint3={}   Joint4={fourth}\n",
            j(0),
            j(1),
            j(2)
        ));
    }
    src
}

proptest! {
    #[test]
    fn joint_tags_are_a_bijection_in_row_order(
        labels in prop::collection::btree_set("J[A-Za-z0-9]{0,5}", 4..20),
        quads in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let labels: Vec<String> = labels.into_iter().collect();
        let tables = S2kReader::parse_str(&document(&labels, &quads)).expect("parses");
        let model = StructuralModel::from_tables(tables, &ModelDefaults::default()).expect("builds");

        prop_assert_eq!(model.joint_count(), labels.len());
        let mut tags = BTreeSet::new();
        for (row, label) in labels.iter().enumerate() {
            let tag = model.joint_tag(label).expect("label is tagged");
            prop_assert_eq!(tag, row + 1);
            prop_assert!(tags.insert(tag));
            prop_assert_eq!(&model.joint(tag).expect("tag resolves").label, label);
        }

        prop_assert_eq!(model.area_count(), quads.len());
        for (element, quad) in model.elements().iter().zip(&quads) {
            let expected = if *quad { ElementShape::Quad } else { ElementShape::Triangle };
            prop_assert_eq!(element.shape(), Some(expected));
            prop_assert_eq!(element.nodes.len(), expected.node_count());
        }
    }
}

//! Tree traversal against the fixture hierarchy and hand-built nodes.

#![cfg(feature = "test-utils")]

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tether_core::test_utils::SynthTree;
use tether_core::{
    AddressError, Child, Component, Node, Parameter, ParameterError, Path, SearchFlags,
    address_to_path, path_to_address,
};

fn addresses(component: &dyn Component) -> Vec<String> {
    component
        .list_parameters()
        .into_iter()
        .map(|(path, _)| path_to_address(&path))
        .collect()
}

// --- List search depth ---

fn list_holder(search: SearchFlags) -> Node {
    let shallow = Parameter::new("shallow", 1);
    let deep = Parameter::new("deep", 2);
    Node::new("holder")
        .with_search(search)
        .with(Child::list([
            Child::from(shallow),
            Child::list([Child::from(deep)]),
        ]))
}

#[test]
fn list_search_disabled_finds_nothing_in_lists() {
    let node = list_holder(SearchFlags::NONE);
    assert!(node.list_parameters().is_empty());
}

#[test]
fn list_search_enabled_finds_exactly_one_level() {
    let node = list_holder(SearchFlags {
        lists: true,
        ..SearchFlags::NONE
    });
    assert_eq!(addresses(&node), vec!["/shallow"]);
}

#[test]
fn list_search_in_fixture_finds_voice_components() {
    let without = SynthTree::new(SearchFlags::NONE);
    assert_eq!(addresses(&without), vec!["/gain", "/osc/freq", "/osc/wave"]);

    let with = SynthTree::new(SearchFlags::ALL);
    assert_eq!(
        addresses(&with),
        vec!["/gain", "/osc/freq", "/osc/wave", "/voice0/detune"]
    );
    let components: Vec<String> = with
        .list_components()
        .into_iter()
        .map(|(p, _)| path_to_address(&p))
        .collect();
    assert_eq!(components, vec!["/osc", "/voice0"]);
}

// --- Reads and writes through the tree ---

#[test]
fn remote_style_write_reaches_application_handle() {
    let synth = SynthTree::new(SearchFlags::NONE);
    synth
        .set_parameter(&address_to_path("/osc/wave"), json!("saw"))
        .unwrap();
    assert_eq!(synth.wave.get(), "saw");

    let read = synth.get_parameter(&address_to_path("/osc/wave")).unwrap();
    assert_eq!(read.value(), json!("saw"));
}

#[test]
fn rejected_write_through_tree_keeps_value() {
    let synth = SynthTree::new(SearchFlags::NONE);
    let err = synth
        .set_parameter(&address_to_path("/osc/wave"), json!("triangle"))
        .unwrap_err();
    assert!(matches!(err, ParameterError::Validation(_)));
    assert_eq!(synth.wave.get(), "sine");
}

#[test]
fn lookup_miss_is_an_address_error() {
    let synth = SynthTree::new(SearchFlags::NONE);
    let err = synth
        .get_parameter(&address_to_path("/osc/phase"))
        .err()
        .unwrap();
    assert!(matches!(err, AddressError::NotFound(ref a) if a == "/osc/phase"));
}

#[test]
fn find_component_resolves_nested_nodes() {
    let synth = SynthTree::new(SearchFlags::NONE);
    let osc = synth.find_component(&address_to_path("/osc")).unwrap();
    assert_eq!(osc.name(), "osc");
    assert_eq!(
        osc.get_parameter(&address_to_path("/freq")).unwrap().value(),
        json!(440.0)
    );
}

// --- Address uniqueness ---

#[test]
fn no_address_binds_two_identities() {
    let shared = Parameter::new("x", 0);
    let inner = Arc::new(
        Node::new("inner")
            .with(&shared)
            .with(Parameter::new("x", 1)),
    );
    let root = Node::new("root")
        .with_search(SearchFlags::ALL)
        .with(&shared)
        .with(Parameter::new("x", 2))
        .with(Child::list([Child::from(&shared), Child::from(Arc::clone(&inner))]))
        .with(Arc::clone(&inner));

    let mut seen: HashMap<Path, *const ()> = HashMap::new();
    for (path, parameter) in root.list_parameters() {
        let identity = parameter.identity();
        if let Some(existing) = seen.insert(path.clone(), identity) {
            assert_eq!(existing, identity, "{} bound twice", path_to_address(&path));
        }
    }
}

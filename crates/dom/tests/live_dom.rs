use dom::{DomError, LiveDom, Mutation, NodeData};
use html_test_support::diff_lines;

fn assert_inner(dom: &LiveDom, expected: &str) {
    let actual = dom.inner_html(dom.root()).expect("root is live");
    if actual != expected {
        panic!(
            "inner html mismatch:\n{}",
            diff_lines(&[expected.to_string()], &[actual])
        );
    }
}

#[test]
fn seeding_from_markup_is_not_a_mutation() {
    let dom = LiveDom::from_markup("<p>a</p><!--c-->text");
    assert_eq!(dom.mutation_count(), 0);
    assert_eq!(dom.child_count(dom.root()), 3);
    assert_inner(&dom, "<p>a</p><!--c-->text");
}

#[test]
fn journal_records_effective_changes_only() {
    let mut dom = LiveDom::from_markup(r#"<p class="a">x</p>"#);
    dom.enable_journal();
    let p = dom.child_at(dom.root(), 0).unwrap();

    assert!(!dom.set_attribute(p, "class", "a").unwrap());
    assert!(dom.set_attribute(p, "class", "b").unwrap());
    assert!(!dom.remove_attribute(p, "id").unwrap());
    assert!(!dom.set_text_content(p, "x").unwrap());
    assert!(dom.set_text_content(p, "y").unwrap());

    let journal = dom.take_mutations();
    assert_eq!(journal.len(), 2);
    assert!(matches!(&journal[0], Mutation::SetAttribute { name, value, .. } if &**name == "class" && value == "b"));
    assert!(matches!(&journal[1], Mutation::SetText { text, .. } if text == "y"));
    assert!(dom.mutations().is_empty());
    assert_eq!(dom.mutation_count(), 2);
}

#[test]
fn moving_an_attached_node_keeps_identity_and_form_state() {
    let mut dom = LiveDom::from_markup(r#"<input value="a"><p>b</p>"#);
    let root = dom.root();
    let input = dom.child_at(root, 0).unwrap();
    assert_eq!(dom.value(input), "a");
    dom.set_value(input, "typed").unwrap();

    dom.enable_journal();
    dom.append_child(root, input).unwrap();
    assert_eq!(dom.child_at(root, 1), Some(input));
    assert_eq!(dom.value(input), "typed");
    assert!(matches!(dom.mutations(), [Mutation::Move { node, before: None, .. }] if *node == input));

    // Already in place: no mutation.
    dom.append_child(root, input).unwrap();
    assert_eq!(dom.mutations().len(), 1);
}

#[test]
fn form_properties_follow_the_dirty_flag_model() {
    let mut dom = LiveDom::from_markup(r#"<input type="checkbox" checked><textarea>hi</textarea>"#);
    let root = dom.root();
    let checkbox = dom.child_at(root, 0).unwrap();
    let textarea = dom.child_at(root, 1).unwrap();

    assert!(dom.checked(checkbox));
    assert!(!dom.form_state(checkbox).unwrap().is_checked_dirty());
    dom.set_checked(checkbox, false).unwrap();
    assert!(dom.form_state(checkbox).unwrap().is_checked_dirty());
    dom.set_attribute(checkbox, "checked", "").unwrap();
    assert!(!dom.checked(checkbox), "dirty property ignores the attribute");

    assert_eq!(dom.value(textarea), "hi");
    assert!(!dom.set_value(textarea, "hi").unwrap());
    assert!(dom.form_state(textarea).unwrap().is_value_dirty());
}

#[test]
fn fragments_insert_their_children_as_one_batch() {
    let mut dom = LiveDom::from_markup("<p>z</p>");
    dom.enable_journal();
    let root = dom.root();
    let anchor = dom.child_at(root, 0).unwrap();
    let fragment = dom.create_fragment();
    let a = dom.create_element("a");
    let b = dom.create_text("b");
    dom.append_child(fragment, a).unwrap();
    dom.append_child(fragment, b).unwrap();
    dom.take_mutations();

    dom.insert_before(root, fragment, Some(anchor)).unwrap();
    assert_eq!(dom.children(root), &[a, b, anchor]);
    assert!(dom.children(fragment).is_empty());
    assert!(matches!(dom.mutations(), [Mutation::InsertFragment { nodes, .. }] if nodes == &vec![a, b]));

    // Discarding the emptied fragment is not a tree mutation.
    dom.remove(fragment).unwrap();
    assert_eq!(dom.mutations().len(), 1);
    assert_inner(&dom, "<a></a>b<p>z</p>");
}

#[test]
fn insert_before_requires_a_child_of_the_parent() {
    let mut dom = LiveDom::from_markup("<div><span></span></div><p></p>");
    let root = dom.root();
    let div = dom.child_at(root, 0).unwrap();
    let span = dom.child_at(div, 0).unwrap();
    let fresh = dom.create_element("em");
    assert_eq!(
        dom.insert_before(root, fresh, Some(span)),
        Err(DomError::NotAChild {
            parent: root,
            child: span
        })
    );
}

#[test]
fn import_clones_a_template_subtree_as_one_create() {
    let template = html::build(r#"<ul id="l"><li>one</li><li>two</li></ul>"#);
    let mut dom = LiveDom::new();
    dom.enable_journal();
    let ul = dom.import(&template.children()[0]);
    assert_eq!(dom.mutations().len(), 1);
    assert_eq!(dom.parent(ul), None);
    assert!(!dom.is_attached(ul));
    dom.append_child(dom.root(), ul).unwrap();
    assert!(dom.is_attached(ul));
    assert_inner(&dom, r#"<ul id="l"><li>one</li><li>two</li></ul>"#);
}

#[test]
fn clear_children_and_materialize() {
    let mut dom = LiveDom::from_markup("<div><b>1</b><i>2</i></div>");
    let div = dom.child_at(dom.root(), 0).unwrap();
    assert_eq!(dom.text_content(div), "12");
    assert_eq!(dom.leaf_content(div), None);
    assert!(dom.clear_children(div).unwrap());
    assert!(!dom.clear_children(div).unwrap());
    assert_eq!(dom.leaf_content(div), Some(String::new()));
    let node = dom.materialize(div).unwrap();
    assert_eq!(html::to_html(&node), "<div></div>");
    assert!(matches!(dom.data(div), Some(NodeData::Element(_))));
}

#[test]
fn parse_into_returns_the_root() {
    let (dom, root) = dom::parse_into("<head><title>t</title></head><p>x</p>");
    assert_eq!(root, dom.root());
    assert_eq!(dom.tag(root), Some("body"));
    assert_eq!(dom.tag(dom.child_at(root, 0).unwrap()), Some("title"));
}

use dom::LiveDom;
use html::DomSnapshot;
use html_test_support::{CaseOutcome, ReconcileCase, diff_lines, load_cases};
use reconcile::{PatchOptions, ReconcileError, patch};

fn run_case(case: &ReconcileCase) -> Result<(), String> {
    let mut dom = LiveDom::from_markup(&case.live);
    let root = dom.root();
    let template = html::build(&case.template);
    let options = PatchOptions {
        allow_inline_events: case.allow_inline_events,
        delegate: None,
    };
    let result = patch(&template, &mut dom, root, options);

    match (case.outcome, &result) {
        (CaseOutcome::Rendered, Ok(_)) => {}
        (CaseOutcome::ScriptInjection, Err(ReconcileError::ScriptInjection { .. })) => {
            if dom.mutation_count() != 0 {
                return Err("refused render still mutated the live tree".into());
            }
        }
        (expected, actual) => {
            return Err(format!("expected outcome {expected:?}, got {actual:?}"));
        }
    }

    let expected = case
        .expected
        .clone()
        .unwrap_or_else(|| html::inner_html(&template));
    let actual = dom.inner_html(root).map_err(|err| err.to_string())?;
    if actual != expected {
        let live = dom.materialize(root).map_err(|err| err.to_string())?;
        return Err(format!(
            "markup mismatch: {actual}\n{}",
            diff_lines(
                DomSnapshot::of_children(&html::build(&expected)).as_lines(),
                DomSnapshot::of_children(&live).as_lines(),
            )
        ));
    }

    if case.outcome == CaseOutcome::Rendered {
        let before = dom.mutation_count();
        let options = PatchOptions {
            allow_inline_events: case.allow_inline_events,
            delegate: None,
        };
        patch(&template, &mut dom, root, options).map_err(|err| err.to_string())?;
        let repeated = (dom.mutation_count() - before) as usize;
        if repeated > case.max_repeat_mutations {
            return Err(format!("second pass produced {repeated} mutation(s)"));
        }
    }
    Ok(())
}

#[test]
fn reconcile_fixture_cases() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/cases.toml");
    let cases = load_cases(path).expect("fixture file loads");
    assert!(!cases.is_empty());

    let failures: Vec<String> = cases
        .iter()
        .filter_map(|case| run_case(case).err().map(|err| format!("[{}] {err}", case.name)))
        .collect();
    assert!(failures.is_empty(), "{} case(s) failed:\n{}", failures.len(), failures.join("\n"));
}

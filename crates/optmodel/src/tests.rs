//! Scenario tests for the registry.

use optmodel_core::{
    AffineTerm, EqualTo, Function, GreaterThan, LessThan, ModelError, Nonnegatives, ScalarAffine,
    ScalarChange, VariableRef, VectorOfVariables,
};

use crate::objective::ObjectiveSense;
use crate::ModelRegistry;

const TOL: f64 = 1e-12;

#[test]
fn test_add_delete_counting() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();

    let mut handles = Vec::new();
    for i in 0..4 {
        handles.push(
            model
                .add_constraint(
                    ScalarAffine::from_terms(&[(v, i as f64)]),
                    LessThan::new(1.0),
                )
                .unwrap(),
        );
    }
    let eq = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), EqualTo::new(0.0))
        .unwrap();

    assert_eq!(model.num_constraints::<ScalarAffine, LessThan>(), 4);
    assert_eq!(model.num_constraints::<ScalarAffine, EqualTo>(), 1);

    model.delete_constraint(handles[1]).unwrap();
    model.delete_constraint(handles[3]).unwrap();
    assert_eq!(model.num_constraints::<ScalarAffine, LessThan>(), 2);
    assert_eq!(model.num_constraints::<ScalarAffine, EqualTo>(), 1);

    assert!(model.is_valid_constraint(handles[0]));
    assert!(!model.is_valid_constraint(handles[1]));
    assert!(model.is_valid_constraint(handles[2]));
    assert!(!model.is_valid_constraint(handles[3]));
    assert!(model.is_valid_constraint(eq));
}

#[test]
fn test_delete_preserves_order_and_other_partitions() {
    // Three ScalarAffine-in-LessThan constraints get handles 1, 2, 3;
    // deleting 2 leaves [1, 3].
    let mut model = ModelRegistry::with_default_kinds();
    let v1 = model.add_variable();
    let v2 = model.add_variable();

    let c1 = model
        .add_constraint(ScalarAffine::from_terms(&[(v1, 1.0)]), LessThan::new(1.0))
        .unwrap();
    let c2 = model
        .add_constraint(ScalarAffine::from_terms(&[(v2, 1.0)]), LessThan::new(2.0))
        .unwrap();
    let c3 = model
        .add_constraint(
            ScalarAffine::from_terms(&[(v1, 1.0), (v2, 1.0)]),
            LessThan::new(3.0),
        )
        .unwrap();
    assert_eq!((c1.raw(), c2.raw(), c3.raw()), (1, 2, 3));

    let other = model
        .add_constraint(ScalarAffine::from_terms(&[(v1, 5.0)]), GreaterThan::new(0.0))
        .unwrap();

    model.delete_constraint(c2).unwrap();

    assert!(model.is_valid_constraint(c1));
    assert!(!model.is_valid_constraint(c2));
    assert!(model.is_valid_constraint(c3));
    assert_eq!(model.num_constraints::<ScalarAffine, LessThan>(), 2);
    assert_eq!(model.constraints::<ScalarAffine, LessThan>(), vec![c1, c3]);

    // Content of the shifted survivor is intact.
    let f3 = model.constraint_function(c3).unwrap();
    assert!(f3.approx_eq(
        &ScalarAffine::from_terms(&[(v1, 1.0), (v2, 1.0)]),
        TOL
    ));
    assert_eq!(model.constraint_set(c3).unwrap().upper, 3.0);

    // The other partition is untouched.
    assert!(model.is_valid_constraint(other));
    assert_eq!(model.num_constraints::<ScalarAffine, GreaterThan>(), 1);
}

#[test]
fn test_handles_unique_across_kinds() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();

    let a = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    let b = model
        .add_constraint(VariableRef::new(v), GreaterThan::new(0.0))
        .unwrap();
    let c = model
        .add_constraint(VectorOfVariables::new(vec![v]), Nonnegatives::new(1))
        .unwrap();

    // One shared counter across all pairs.
    assert_eq!((a.raw(), b.raw(), c.raw()), (1, 2, 3));
    // Equality compares values only, even across kinds.
    assert_ne!(a, b);
    assert_eq!(b, crate::ConstraintHandle::<ScalarAffine, LessThan>::from_raw(2));
}

#[test]
fn test_deleted_handle_never_revalidated() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    let c = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    assert!(model.is_valid_constraint(c));
    model.delete_constraint(c).unwrap();
    assert!(!model.is_valid_constraint(c));

    // Later adds shift into the freed position without reusing the value.
    let d = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 2.0)]), LessThan::new(0.0))
        .unwrap();
    assert_ne!(c.raw(), d.raw());
    assert!(!model.is_valid_constraint(c));
    assert!(model.is_valid_constraint(d));
}

#[test]
fn test_variable_delete_cascades() {
    // A single-variable lower-bound constraint receiving handle 4
    // becomes invalid when its variable is deleted, with no explicit
    // delete_constraint call.
    let mut model = ModelRegistry::with_default_kinds();
    let v1 = model.add_variable();
    let v2 = model.add_variable();

    for upper in [1.0, 2.0, 3.0] {
        model
            .add_constraint(
                ScalarAffine::from_terms(&[(v1, 1.0), (v2, 1.0)]),
                LessThan::new(upper),
            )
            .unwrap();
    }
    let bound = model
        .add_constraint(VariableRef::new(v1), GreaterThan::new(0.0))
        .unwrap();
    assert_eq!(bound.raw(), 4);

    model.set_objective_sense(ObjectiveSense::Minimize);
    model.set_objective_function(ScalarAffine::from_terms(&[(v1, 1.0), (v2, 2.0)]));

    model.delete_variable(v1).unwrap();

    assert!(!model.is_valid_variable(v1));
    assert!(model.is_valid_variable(v2));
    assert_eq!(model.num_variables(), 1);

    // The projection constraint is gone as a cascade side effect.
    assert!(!model.is_valid_constraint(bound));
    assert_eq!(model.num_constraints::<VariableRef, GreaterThan>(), 0);

    // Aggregate constraints survive with the variable stripped.
    assert_eq!(model.num_constraints::<ScalarAffine, LessThan>(), 3);
    for handle in model.constraints::<ScalarAffine, LessThan>() {
        let function = model.constraint_function(handle).unwrap();
        assert!(function.approx_eq(&ScalarAffine::from_terms(&[(v2, 1.0)]), TOL));
    }

    // The objective lost the variable too.
    let expected: crate::ScalarFunction = ScalarAffine::from_terms(&[(v2, 2.0)]).into();
    assert!(model.objective_function().approx_eq(&expected, TOL));
}

#[test]
fn test_variable_delete_resizes_vector_constraints() {
    let mut model = ModelRegistry::with_default_kinds();
    let v1 = model.add_variable();
    let v2 = model.add_variable();
    let c = model
        .add_constraint(VectorOfVariables::new(vec![v1, v2]), Nonnegatives::new(2))
        .unwrap();

    model.delete_variable(v1).unwrap();

    assert!(model.is_valid_constraint(c));
    assert_eq!(
        model.constraint_function(c).unwrap().variables,
        vec![v2]
    );
    assert_eq!(model.constraint_set(c).unwrap().dimension, 1);
}

#[test]
fn test_delete_variable_twice_fails() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    model.delete_variable(v).unwrap();
    assert!(matches!(
        model.delete_variable(v),
        Err(ModelError::InvalidIndex { .. })
    ));
}

#[test]
fn test_presence_tracking_after_first_delete() {
    let mut model = ModelRegistry::with_default_kinds();
    let v1 = model.add_variable();
    let v2 = model.add_variable();
    let v3 = model.add_variable();
    assert_eq!(model.variables(), vec![v1, v2, v3]);

    model.delete_variable(v2).unwrap();
    let v4 = model.add_variable();

    assert_eq!(model.num_variables(), 3);
    assert_eq!(model.variables(), vec![v1, v3, v4]);
    assert!(!model.is_valid_variable(v2));
    assert!(model.is_valid_variable(v4));
}

#[test]
fn test_variable_name_roundtrip() {
    let mut model = ModelRegistry::with_default_kinds();
    let v1 = model.add_variable();
    let v2 = model.add_variable();
    model.set_variable_name(v1, "x").unwrap();
    model.set_variable_name(v2, "y").unwrap();

    assert_eq!(model.variable_name(v1), Some("x"));
    assert_eq!(model.variable_by_name("x").unwrap(), Some(v1));
    assert_eq!(model.variable_by_name("y").unwrap(), Some(v2));
    assert_eq!(model.variable_by_name("z").unwrap(), None);

    // Renaming frees the old name on the next lookup.
    model.set_variable_name(v1, "x2").unwrap();
    assert_eq!(model.variable_by_name("x").unwrap(), None);
    assert_eq!(model.variable_by_name("x2").unwrap(), Some(v1));
}

#[test]
fn test_ambiguous_constraint_name() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    let a = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    let b = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 2.0)]), LessThan::new(0.0))
        .unwrap();

    // Assigning a duplicate is always permitted.
    model.set_constraint_name(a, "c1").unwrap();
    model.set_constraint_name(b, "c1").unwrap();

    assert!(matches!(
        model.constraint_by_name::<ScalarAffine, LessThan>("c1"),
        Err(ModelError::AmbiguousName(_))
    ));

    // Deleting one duplicate invalidates the cache; the rebuild sees a
    // unique name again.
    model.delete_constraint(a).unwrap();
    assert_eq!(
        model
            .constraint_by_name::<ScalarAffine, LessThan>("c1")
            .unwrap(),
        Some(b)
    );
}

#[test]
fn test_constraint_name_lookup_is_kind_checked() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    let c = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    model.set_constraint_name(c, "c1").unwrap();

    assert_eq!(
        model
            .constraint_by_name::<ScalarAffine, LessThan>("c1")
            .unwrap(),
        Some(c)
    );
    // Same name looked up under a different pair resolves to nothing.
    assert_eq!(
        model
            .constraint_by_name::<VariableRef, GreaterThan>("c1")
            .unwrap(),
        None
    );
}

#[test]
fn test_cascade_forgets_victim_names() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    let bound = model
        .add_constraint(VariableRef::new(v), GreaterThan::new(0.0))
        .unwrap();
    model.set_constraint_name(bound, "lb").unwrap();

    model.delete_variable(v).unwrap();
    assert_eq!(
        model
            .constraint_by_name::<VariableRef, GreaterThan>("lb")
            .unwrap(),
        None
    );
}

#[test]
fn test_unsupported_constraint_kind() {
    let mut model = ModelRegistry::builder()
        .with_constraint_kind::<ScalarAffine, LessThan>()
        .build();
    let v = model.add_variable();

    assert!(matches!(
        model.add_constraint(VariableRef::new(v), GreaterThan::new(0.0)),
        Err(ModelError::UnsupportedConstraintKind {
            function: "VariableRef",
            set: "GreaterThan",
        })
    ));
    assert!(matches!(
        model.reserve_constraints::<VariableRef, GreaterThan>(2),
        Err(ModelError::UnsupportedConstraintKind { .. })
    ));
    // Unregistered pairs count zero and list no handles.
    assert_eq!(model.num_constraints::<VariableRef, GreaterThan>(), 0);
    assert!(model.constraints::<VariableRef, GreaterThan>().is_empty());
}

#[test]
fn test_constraint_kinds_lists_nonempty_pairs() {
    let mut model = ModelRegistry::with_default_kinds();
    assert!(model.constraint_kinds().is_empty());

    let v = model.add_variable();
    let c = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    model
        .add_constraint(VariableRef::new(v), GreaterThan::new(0.0))
        .unwrap();

    let kinds = model.constraint_kinds();
    assert_eq!(kinds.len(), 2);
    assert!(kinds
        .iter()
        .any(|k| k.function_name() == "ScalarAffine" && k.set_name() == "LessThan"));

    model.delete_constraint(c).unwrap();
    assert_eq!(model.constraint_kinds().len(), 1);
}

#[test]
fn test_set_and_modify_constraint() {
    let mut model = ModelRegistry::with_default_kinds();
    let v1 = model.add_variable();
    let v2 = model.add_variable();
    let c = model
        .add_constraint(ScalarAffine::from_terms(&[(v1, 1.0)]), LessThan::new(1.0))
        .unwrap();

    model
        .modify_constraint(c, &ScalarChange::Coefficient(v2, 3.0))
        .unwrap();
    model
        .modify_constraint(c, &ScalarChange::Constant(0.5))
        .unwrap();
    let expected = ScalarAffine::new(
        vec![AffineTerm::new(v1, 1.0), AffineTerm::new(v2, 3.0)],
        0.5,
    );
    assert!(model.constraint_function(c).unwrap().approx_eq(&expected, TOL));

    model.set_constraint_set(c, LessThan::new(9.0)).unwrap();
    assert_eq!(model.constraint_set(c).unwrap().upper, 9.0);

    model
        .set_constraint_function(c, ScalarAffine::from_terms(&[(v2, 7.0)]))
        .unwrap();
    assert!(model
        .constraint_function(c)
        .unwrap()
        .approx_eq(&ScalarAffine::from_terms(&[(v2, 7.0)]), TOL));
}

#[test]
fn test_invalid_constraint_handle_errors() {
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    let c = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    model.delete_constraint(c).unwrap();

    assert!(matches!(
        model.constraint_function(c),
        Err(ModelError::InvalidIndex { .. })
    ));
    assert!(matches!(
        model.set_constraint_set(c, LessThan::new(1.0)),
        Err(ModelError::InvalidIndex { .. })
    ));
    assert!(matches!(
        model.delete_constraint(c),
        Err(ModelError::InvalidIndex { .. })
    ));
    // Never issued.
    let ghost = crate::ConstraintHandle::<ScalarAffine, LessThan>::from_raw(99);
    assert!(matches!(
        model.constraint_set(ghost),
        Err(ModelError::InvalidIndex { .. })
    ));
}

#[test]
fn test_objective_surface() {
    let mut model = ModelRegistry::with_default_kinds();
    assert_eq!(model.objective_sense(), ObjectiveSense::Feasibility);

    let v = model.add_variable();
    model.set_objective_sense(ObjectiveSense::Maximize);
    model.set_objective_function(ScalarAffine::from_terms(&[(v, 1.0)]));
    model.modify_objective(&ScalarChange::Constant(2.0)).unwrap();
    model
        .modify_objective(&ScalarChange::Coefficient(v, 5.0))
        .unwrap();

    let expected: crate::ScalarFunction =
        ScalarAffine::new(vec![AffineTerm::new(v, 5.0)], 2.0).into();
    assert_eq!(model.objective_sense(), ObjectiveSense::Maximize);
    assert!(model.objective_function().approx_eq(&expected, TOL));

    // A single-variable objective accepts no delta.
    model.set_objective_function(VariableRef::new(v));
    assert!(matches!(
        model.modify_objective(&ScalarChange::Constant(1.0)),
        Err(ModelError::UnsupportedModification(_))
    ));
}

#[test]
fn test_is_empty_permanence() {
    let model = ModelRegistry::with_default_kinds();
    assert!(model.is_empty());

    // Any variable breaks emptiness forever, even after deletion.
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    assert!(!model.is_empty());
    model.delete_variable(v).unwrap();
    assert!(!model.is_empty());

    // Any constraint breaks it too.
    let mut model = ModelRegistry::with_default_kinds();
    let v = model.add_variable();
    let c = model
        .add_constraint(ScalarAffine::from_terms(&[(v, 1.0)]), LessThan::new(0.0))
        .unwrap();
    model.delete_constraint(c).unwrap();
    assert!(!model.is_empty());

    // Setting the sense alone, even to the default, breaks it.
    let mut model = ModelRegistry::with_default_kinds();
    model.set_objective_sense(ObjectiveSense::Feasibility);
    assert!(!model.is_empty());

    // Setting the function alone, even to the empty function, breaks it.
    let mut model = ModelRegistry::with_default_kinds();
    model.set_objective_function(ScalarAffine::empty());
    assert!(!model.is_empty());
}

#[test]
fn test_two_phase_load_matches_immediate_add() {
    let data: Vec<(f64, f64)> = vec![(1.0, 4.0), (2.0, 5.0), (3.0, 6.0)];

    // Immediate path.
    let mut immediate = ModelRegistry::with_default_kinds();
    let vars_a = immediate.add_variables(2);
    let mut handles_a = Vec::new();
    for (i, &(coefficient, upper)) in data.iter().enumerate() {
        let c = immediate
            .add_constraint(
                ScalarAffine::from_terms(&[(vars_a[0], coefficient), (vars_a[1], 1.0)]),
                LessThan::new(upper),
            )
            .unwrap();
        immediate.set_constraint_name(c, format!("c{i}")).unwrap();
        handles_a.push(c);
    }

    // Two-phase path: allocate everything first, then load bodies.
    let mut deferred = ModelRegistry::with_default_kinds();
    let vars_b = deferred.add_variables(2);
    let handles_b = deferred
        .reserve_constraints::<ScalarAffine, LessThan>(data.len())
        .unwrap();
    for (i, (&handle, &(coefficient, upper))) in handles_b.iter().zip(&data).enumerate() {
        deferred
            .load_constraint(
                handle,
                ScalarAffine::from_terms(&[(vars_b[0], coefficient), (vars_b[1], 1.0)]),
                LessThan::new(upper),
            )
            .unwrap();
        deferred.set_constraint_name(handle, format!("c{i}")).unwrap();
    }

    // Identical final state: same handles, same bodies, same names.
    assert_eq!(immediate.variables(), deferred.variables());
    assert_eq!(handles_a, handles_b);
    assert_eq!(
        immediate.num_constraints::<ScalarAffine, LessThan>(),
        deferred.num_constraints::<ScalarAffine, LessThan>()
    );
    for (&a, &b) in handles_a.iter().zip(&handles_b) {
        assert!(immediate
            .constraint_function(a)
            .unwrap()
            .approx_eq(deferred.constraint_function(b).unwrap(), TOL));
        assert_eq!(
            immediate.constraint_set(a).unwrap(),
            deferred.constraint_set(b).unwrap()
        );
        assert_eq!(immediate.constraint_name(a), deferred.constraint_name(b));
    }
}

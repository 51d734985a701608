//! End-to-end evaluation tests through the public engine API.

use std::collections::HashMap;

use fhirpatch::{FhirPathEngine, ModelInfo};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};

fn patient() -> Value {
    json!({
        "resourceType": "Patient",
        "id": "example",
        "active": true,
        "birthDate": "1974-12-25",
        "name": [
            {"use": "official", "family": "Chalmers", "given": ["Peter", "James"]},
            {"use": "usual", "given": ["Jim"]}
        ],
        "identifier": [
            {"system": "urn:a", "value": "123"},
            {"system": "urn:b", "value": "456"}
        ],
        "telecom": [
            {"system": "phone", "value": "555-1"},
            {"system": "phone", "value": "555-2"},
            {"system": "email", "value": "p@example.org"}
        ]
    })
}

fn eval(expr: &str) -> Vec<Value> {
    FhirPathEngine::new()
        .evaluate(expr, &patient())
        .unwrap_or_else(|e| panic!("{expr}: {e}"))
}

#[test]
fn literal_arithmetic() {
    assert_eq!(eval("1 + 2"), vec![json!(3)]);
    assert_eq!(eval("7.5 - 2.5"), vec![json!(5)]);
    assert_eq!(eval("3 * 4"), vec![json!(12)]);
    assert_eq!(eval("10 div 3"), vec![json!(3)]);
    assert_eq!(eval("10 mod 3"), vec![json!(1)]);
    assert_eq!(eval("1 / 4"), vec![json!(0.25)]);
}

#[test]
fn member_navigation_flattens_arrays() {
    assert_eq!(
        eval("Patient.name.given"),
        vec![json!("Peter"), json!("James"), json!("Jim")]
    );
    // the leading type filter is optional
    assert_eq!(eval("name.family"), vec![json!("Chalmers")]);
    // a non-matching type filter yields nothing
    assert_eq!(eval("Observation.id"), Vec::<Value>::new());
}

#[test]
fn indexing_selects_one_element() {
    assert_eq!(eval("name[1].given"), vec![json!("Jim")]);
    assert_eq!(eval("name[5]"), Vec::<Value>::new());
    assert_eq!(eval("telecom[0].value"), vec![json!("555-1")]);
}

#[test]
fn where_and_select() {
    assert_eq!(
        eval("name.where(use = 'official').family"),
        vec![json!("Chalmers")]
    );
    assert_eq!(
        eval("name.select(given.first())"),
        vec![json!("Peter"), json!("Jim")]
    );
    assert_eq!(
        eval("telecom.where(system = 'phone').count()"),
        vec![json!(2)]
    );
}

#[test]
fn existence_functions() {
    assert_eq!(eval("telecom.exists(system = 'email')"), vec![json!(true)]);
    assert_eq!(eval("name.empty()"), vec![json!(false)]);
    assert_eq!(eval("deceased.empty()"), vec![json!(true)]);
    assert_eq!(eval("identifier.all(system.startsWith('urn'))"), vec![json!(true)]);
    assert_eq!(eval("name.given.distinct().count()"), vec![json!(3)]);
}

// empty operands make comparison and arithmetic operators yield empty,
// not false and not an error
#[rstest]
#[case("unknownField = 1")]
#[case("1 != unknownField")]
#[case("unknownField < 5")]
#[case("5 > unknownField")]
#[case("unknownField <= 5")]
#[case("5 >= unknownField")]
#[case("unknownField + 1")]
#[case("2 - unknownField")]
#[case("unknownField * 3")]
#[case("4 / unknownField")]
#[case("{} = {}")]
fn empty_operand_propagates(#[case] expr: &str) {
    assert_eq!(eval(expr), Vec::<Value>::new(), "{expr}");
}

#[test]
fn equivalence_decides_where_equality_cannot() {
    assert_eq!(eval("{} ~ {}"), vec![json!(true)]);
    assert_eq!(eval("{} ~ 1"), Vec::<Value>::new());
    assert_eq!(eval("'Hello  World' ~ 'hello world'"), vec![json!(true)]);
    assert_eq!(eval("'a' !~ 'b'"), vec![json!(true)]);
}

#[test]
fn three_valued_logic() {
    assert_eq!(eval("true or unknownField.exists(id = 1)"), vec![json!(true)]);
    assert_eq!(eval("{} or true"), vec![json!(true)]);
    assert_eq!(eval("{} and false"), vec![json!(false)]);
    assert_eq!(eval("{} and true"), Vec::<Value>::new());
    assert_eq!(eval("false implies {}"), vec![json!(true)]);
    assert_eq!(eval("{} xor true"), Vec::<Value>::new());
}

#[test]
fn partial_dates_without_a_verdict_yield_empty() {
    assert_eq!(eval("@2018-03 = @2018-03-01"), Vec::<Value>::new());
    // same precision and equal, so the ordering is decided
    assert_eq!(eval("@2018-03 < @2018-03"), vec![json!(false)]);
    assert_eq!(eval("@2018-03 < @2018-04-01"), vec![json!(true)]);
    assert_eq!(eval("@2017 < @2018-03"), vec![json!(true)]);
    assert_eq!(eval("birthDate = @1974-12-25"), vec![json!(true)]);
}

#[test]
fn string_functions() {
    assert_eq!(eval("'hello'.length()"), vec![json!(5)]);
    assert_eq!(eval("'hello'.substring(1, 3)"), vec![json!("ell")]);
    assert_eq!(eval("'hello'.indexOf('ll')"), vec![json!(2)]);
    assert_eq!(eval("name.family.replace('mers', '')"), vec![json!("Chal")]);
    assert_eq!(eval("id.matches('^[a-z]+$')"), vec![json!(true)]);
    assert_eq!(eval("'a' + 'b' = 'ab'"), vec![json!(true)]);
    assert_eq!(eval("{} & 'tail'"), vec![json!("tail")]);
}

// string functions demand exactly one string input
#[rstest]
#[case("deceased.length()")]
#[case("name.given.length()")]
#[case("active.substring(0)")]
fn string_function_input_must_be_a_single_string(#[case] expr: &str) {
    assert!(FhirPathEngine::new().evaluate(expr, &patient()).is_err(), "{expr}");
}

#[test]
fn math_functions() {
    assert_eq!(eval("(-3).abs()"), vec![json!(3)]);
    assert_eq!(eval("16.sqrt()"), vec![json!(4)]);
    assert_eq!(eval("2.power(10)"), vec![json!(1024)]);
    assert_eq!(eval("3.7.floor()"), vec![json!(3)]);
    assert_eq!(eval("3.2.ceiling()"), vec![json!(4)]);
    // undefined results are empty, not errors
    assert_eq!(eval("(-1).sqrt()"), Vec::<Value>::new());
    assert_eq!(eval("(-1).ln()"), Vec::<Value>::new());
}

#[test]
fn iif_evaluates_only_the_taken_branch() {
    assert_eq!(eval("iif(active, 'yes', 'no')"), vec![json!("yes")]);
    // the untaken branch would error if it were evaluated
    assert_eq!(eval("iif(true, 1, 'x'.substring())"), vec![json!(1)]);
    assert_eq!(eval("iif({}, 'yes')"), Vec::<Value>::new());
}

#[test]
fn union_merges_and_deduplicates() {
    assert_eq!(
        eval("name[0].given | name[1].given | 'Jim'"),
        vec![json!("Peter"), json!("James"), json!("Jim")]
    );
    assert_eq!(eval("(1 | 2 | 2 | 1).count()"), vec![json!(2)]);
}

#[test]
fn type_operations() {
    assert_eq!(eval("active is Boolean"), vec![json!(true)]);
    assert_eq!(eval("$this is Patient"), vec![json!(true)]);
    assert_eq!(eval("birthDate is Integer"), vec![json!(false)]);
    assert_eq!(
        eval("(1 | 'two' | 3).ofType(Integer).count()"),
        vec![json!(2)]
    );
    assert_eq!(eval("(5 as Integer) + 1"), vec![json!(6)]);
}

#[test]
fn conversions() {
    assert_eq!(eval("'42'.toInteger() + 1"), vec![json!(43)]);
    assert_eq!(eval("'x'.toInteger()"), Vec::<Value>::new());
    assert_eq!(eval("1.toString()"), vec![json!("1")]);
    assert_eq!(eval("'true'.toBoolean()"), vec![json!(true)]);
}

#[test]
fn aggregate_folds_with_total() {
    assert_eq!(
        eval("(1 | 2 | 3).aggregate($this + $total, 10)"),
        vec![json!(16)]
    );
    assert_eq!(
        eval("name.given.aggregate(iif($total.empty(), $this, $total))"),
        vec![json!("Peter")]
    );
}

#[test]
fn iif_sees_the_enclosing_lambda_bindings() {
    assert_eq!(
        eval("name.given.select(iif($index = 0, $this, 'later'))"),
        vec![json!("Peter"), json!("later"), json!("later")]
    );
    assert_eq!(
        eval("(1 | 2 | 3).aggregate(iif($total.empty(), $this, $total + $this))"),
        vec![json!(6)]
    );
}

#[test]
fn membership_operators() {
    assert_eq!(eval("'Jim' in name.given"), vec![json!(true)]);
    assert_eq!(eval("name.given contains 'Peter'"), vec![json!(true)]);
    assert_eq!(eval("{} in name.given"), Vec::<Value>::new());
}

#[test]
fn environment_variables() {
    let vars = HashMap::from([("pet".to_string(), json!("cat"))]);
    let engine = FhirPathEngine::new();
    assert_eq!(
        engine
            .evaluate_with_vars("%pet = 'cat'", &patient(), &vars)
            .unwrap(),
        vec![json!(true)]
    );
    assert_eq!(
        engine.evaluate("%context.id", &patient()).unwrap(),
        vec![json!("example")]
    );
    assert!(engine.evaluate("%missing", &patient()).is_err());
}

#[test]
fn index_variable_in_lambdas() {
    assert_eq!(
        eval("telecom.where($index < 2).count()"),
        vec![json!(2)]
    );
    assert_eq!(
        eval("name.given.select($index)"),
        vec![json!(0), json!(1), json!(2)]
    );
}

#[test]
fn model_resolves_choice_type_fields() {
    let mut model = ModelInfo::empty();
    model
        .choice_type_paths
        .insert("Observation.value".into(), vec!["Quantity".into(), "String".into()]);
    let engine = FhirPathEngine::with_model(model);
    let observation = json!({
        "resourceType": "Observation",
        "status": "final",
        "valueQuantity": {"value": 185, "unit": "lbs"}
    });
    assert_eq!(
        engine.evaluate("Observation.value.unit", &observation).unwrap(),
        vec![json!("lbs")]
    );
    // without the model the bare choice stem resolves to nothing
    assert_eq!(
        FhirPathEngine::new()
            .evaluate("Observation.value.unit", &observation)
            .unwrap(),
        Vec::<Value>::new()
    );
}

#[test]
fn unknown_function_is_an_error() {
    assert!(FhirPathEngine::new().evaluate("name.frobnicate()", &patient()).is_err());
    assert!(FhirPathEngine::new().evaluate("name.count(1, 2)", &patient()).is_err());
}

//! Function and operator registry.
//!
//! One flat table maps every invocable name, including operator keys such as
//! `"+"` and `"and"`, to its handler, accepted signatures and nullability.
//! The evaluator selects a signature by argument count and realizes each
//! argument per its [`ParamSpec`] before dispatching.

pub(crate) mod functions;
mod invocation;

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

pub use invocation::{Handler, Invocation, Param, ParamSpec};

use functions::{
    aggregate, collections, combining, datetime, equality, existence, filtering, logic, math,
    misc, navigation, strings, types,
};

const NO_ARGS: &[ParamSpec] = &[];
const EXPR_1: &[ParamSpec] = &[ParamSpec::Expr];
const EXPR_2: &[ParamSpec] = &[ParamSpec::Expr, ParamSpec::Expr];
const EXPR_ANY: &[ParamSpec] = &[ParamSpec::Expr, ParamSpec::Any];
const EXPR_3: &[ParamSpec] = &[ParamSpec::Expr, ParamSpec::Expr, ParamSpec::Expr];
const ANY_AT_ROOT_1: &[ParamSpec] = &[ParamSpec::AnyAtRoot];
const ANY_2: &[ParamSpec] = &[ParamSpec::Any, ParamSpec::Any];
const TYPE_1: &[ParamSpec] = &[ParamSpec::TypeSpecifier];
const STRING_1: &[ParamSpec] = &[ParamSpec::String];
const STRING_2: &[ParamSpec] = &[ParamSpec::String, ParamSpec::String];
const INTEGER_1: &[ParamSpec] = &[ParamSpec::Integer];
const INTEGER_2: &[ParamSpec] = &[ParamSpec::Integer, ParamSpec::Integer];
const NUMBER_1: &[ParamSpec] = &[ParamSpec::Number];
const NUMBER_2: &[ParamSpec] = &[ParamSpec::Number, ParamSpec::Number];
const BOOL_2: &[ParamSpec] = &[ParamSpec::MaybeBoolean, ParamSpec::MaybeBoolean];

macro_rules! entry {
    ($table:expr, $name:literal, $handler:path, $sigs:expr) => {
        entry!($table, $name, $handler, $sigs, false)
    };
    ($table:expr, $name:literal, $handler:path, $sigs:expr, $nullable:expr) => {
        $table.insert(
            $name,
            Invocation {
                handler: $handler,
                signatures: $sigs,
                nullable: $nullable,
            },
        )
    };
}

static INVOCATIONS: Lazy<FxHashMap<&'static str, Invocation>> = Lazy::new(|| {
    let mut t: FxHashMap<&'static str, Invocation> = FxHashMap::default();

    // Existence
    entry!(t, "empty", existence::empty_fn, &[NO_ARGS]);
    entry!(t, "not", existence::not_fn, &[NO_ARGS]);
    entry!(t, "exists", existence::exists_fn, &[NO_ARGS, EXPR_1]);
    entry!(t, "all", existence::all_fn, &[EXPR_1]);
    entry!(t, "allTrue", existence::all_true, &[NO_ARGS]);
    entry!(t, "anyTrue", existence::any_true, &[NO_ARGS]);
    entry!(t, "allFalse", existence::all_false, &[NO_ARGS]);
    entry!(t, "anyFalse", existence::any_false, &[NO_ARGS]);
    entry!(t, "subsetOf", existence::subset_of, &[ANY_AT_ROOT_1]);
    entry!(t, "supersetOf", existence::superset_of, &[ANY_AT_ROOT_1]);
    entry!(t, "isDistinct", existence::is_distinct, &[NO_ARGS]);
    entry!(t, "distinct", existence::distinct, &[NO_ARGS]);
    entry!(t, "count", existence::count, &[NO_ARGS]);

    // Filtering and projection
    entry!(t, "where", filtering::where_fn, &[EXPR_1]);
    entry!(t, "select", filtering::select_fn, &[EXPR_1]);
    entry!(t, "repeat", filtering::repeat_fn, &[EXPR_1]);
    entry!(t, "ofType", filtering::of_type, &[TYPE_1]);
    entry!(t, "single", filtering::single, &[NO_ARGS]);
    entry!(t, "first", filtering::first, &[NO_ARGS]);
    entry!(t, "last", filtering::last, &[NO_ARGS]);
    entry!(t, "tail", filtering::tail, &[NO_ARGS]);
    entry!(t, "take", filtering::take, &[INTEGER_1]);
    entry!(t, "skip", filtering::skip, &[INTEGER_1]);

    // Aggregates
    entry!(t, "aggregate", aggregate::aggregate_fn, &[EXPR_1, EXPR_ANY]);

    // Combining
    entry!(t, "combine", combining::combine, &[ANY_AT_ROOT_1]);
    entry!(t, "union", combining::union_fn, &[ANY_AT_ROOT_1]);

    // Control flow and conversion
    entry!(t, "iif", misc::iif_fn, &[EXPR_2, EXPR_3]);
    entry!(t, "trace", misc::trace_fn, &[NO_ARGS, STRING_1]);
    entry!(t, "toInteger", misc::to_integer, &[NO_ARGS]);
    entry!(t, "toDecimal", misc::to_decimal, &[NO_ARGS]);
    entry!(t, "toString", misc::to_string, &[NO_ARGS]);
    entry!(t, "toBoolean", misc::to_boolean, &[NO_ARGS]);
    entry!(t, "toDateTime", misc::to_date_time, &[NO_ARGS]);
    entry!(t, "toTime", misc::to_time, &[NO_ARGS]);

    // Strings
    entry!(t, "indexOf", strings::index_of, &[STRING_1]);
    entry!(t, "substring", strings::substring, &[INTEGER_1, INTEGER_2]);
    entry!(t, "startsWith", strings::starts_with, &[STRING_1]);
    entry!(t, "endsWith", strings::ends_with, &[STRING_1]);
    entry!(t, "contains", strings::contains_fn, &[STRING_1]);
    entry!(t, "replace", strings::replace_fn, &[STRING_2]);
    entry!(t, "matches", strings::matches_fn, &[STRING_1]);
    entry!(t, "replaceMatches", strings::replace_matches, &[STRING_2]);
    entry!(t, "length", strings::length_fn, &[NO_ARGS]);

    // Math
    entry!(t, "abs", math::abs_fn, &[NO_ARGS]);
    entry!(t, "ceiling", math::ceiling, &[NO_ARGS]);
    entry!(t, "exp", math::exp_fn, &[NO_ARGS]);
    entry!(t, "floor", math::floor_fn, &[NO_ARGS]);
    entry!(t, "ln", math::ln_fn, &[NO_ARGS]);
    entry!(t, "log", math::log_fn, &[NUMBER_1], true);
    entry!(t, "power", math::power, &[NUMBER_1], true);
    entry!(t, "round", math::round_fn, &[NO_ARGS, NUMBER_1]);
    entry!(t, "sqrt", math::sqrt_fn, &[NO_ARGS]);
    entry!(t, "truncate", math::truncate_fn, &[NO_ARGS]);

    // Date/time
    entry!(t, "now", datetime::now_fn, &[NO_ARGS]);
    entry!(t, "today", datetime::today_fn, &[NO_ARGS]);

    // Tree navigation
    entry!(t, "children", navigation::children, &[NO_ARGS]);
    entry!(t, "descendants", navigation::descendants, &[NO_ARGS]);

    // Types
    entry!(t, "is", types::is_fn, &[TYPE_1]);
    entry!(t, "type", types::type_fn, &[NO_ARGS]);

    // Equality and ordering operators
    entry!(t, "=", equality::equal, &[ANY_2], true);
    entry!(t, "!=", equality::not_equal, &[ANY_2], true);
    entry!(t, "~", equality::equivalent, &[ANY_2]);
    entry!(t, "!~", equality::not_equivalent, &[ANY_2]);
    entry!(t, "<", equality::less_than, &[ANY_2], true);
    entry!(t, ">", equality::greater_than, &[ANY_2], true);
    entry!(t, "<=", equality::less_or_equal, &[ANY_2], true);
    entry!(t, ">=", equality::greater_or_equal, &[ANY_2], true);

    // Arithmetic and string operators
    entry!(t, "|", combining::union_op, &[ANY_2]);
    entry!(t, "+", math::plus, &[ANY_2], true);
    entry!(t, "-", math::minus, &[ANY_2], true);
    entry!(t, "*", math::multiply, &[NUMBER_2], true);
    entry!(t, "/", math::divide, &[NUMBER_2], true);
    entry!(t, "mod", math::modulo, &[NUMBER_2], true);
    entry!(t, "div", math::int_divide, &[NUMBER_2], true);
    entry!(t, "&", math::amp, &[STRING_2]);

    // Membership
    entry!(t, "inOp", collections::in_op, &[ANY_2]);
    entry!(t, "containsOp", collections::contains_op, &[ANY_2]);

    // Boolean logic
    entry!(t, "and", logic::and_op, &[BOOL_2]);
    entry!(t, "or", logic::or_op, &[BOOL_2]);
    entry!(t, "xor", logic::xor_op, &[BOOL_2]);
    entry!(t, "implies", logic::implies_op, &[BOOL_2]);

    t
});

pub(crate) fn lookup(name: &str) -> Option<&'static Invocation> {
    INVOCATIONS.get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_and_functions_share_the_table() {
        assert!(lookup("where").is_some());
        assert!(lookup("implies").is_some());
        assert!(lookup("+").is_some());
        assert!(lookup("nope").is_none());
    }

    #[test]
    fn exists_has_two_signatures() {
        let inv = lookup("exists").unwrap();
        assert_eq!(inv.signatures.len(), 2);
        assert!(!inv.nullable);
    }
}

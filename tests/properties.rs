//! Property tests: classification totality, run determinism, duplicate
//! tie-break stability and the implicit route/query round trip.

mod common;

use common::{run_sources, sources};
use proptest::prelude::*;
use routegen::analysis::{Classifier, GroupTable, ParameterOutcome};
use routegen::extraction::{AttributeDecl, ParamDecl, StructDecl};
use routegen::{run, CancelFlag, DiagnosticId, PipelineSettings, Severity, TypeRef};

const PLACEHOLDERS: [&str; 4] = ["id", "slug", "tenant", "year"];
const PARAM_NAMES: [&str; 6] = ["id", "slug", "page", "filter", "repo", "ctx"];
const TYPES: [&str; 8] = [
    "i64",
    "String",
    "Option<u32>",
    "Vec<String>",
    "Widget",
    "HttpContext",
    "&str",
    "bool",
];
const ATTRS: [&str; 8] = [
    "",
    "#[query] ",
    "#[header] ",
    "#[body] ",
    "#[service] ",
    "#[route] ",
    "#[query] #[body] ",
    "#[keyed_service] ",
];

fn handler_source(name: &'static str) -> impl Strategy<Value = (String, usize)> {
    (
        prop::sample::subsequence(PLACEHOLDERS.to_vec(), 0..=3),
        prop::sample::subsequence(PARAM_NAMES.to_vec(), 0..=4),
        prop::collection::vec((0..TYPES.len(), 0..ATTRS.len()), 4),
        prop::sample::select(vec!["get", "post", "put", "delete"]),
    )
        .prop_map(move |(placeholders, names, choices, verb)| {
            let mut path = String::from("/items");
            for placeholder in &placeholders {
                path.push_str(&format!("/{{{placeholder}}}"));
            }
            let params: Vec<String> = names
                .iter()
                .zip(choices)
                .map(|(param, (ty, attr))| format!("{}{param}: {}", ATTRS[attr], TYPES[ty]))
                .collect();
            let code = format!(
                "#[{verb}(\"{path}\")]\npub fn {name}({}) -> ErrorOr<u8> {{ todo!() }}\n",
                params.join(", ")
            );
            (code, names.len())
        })
}

fn type_ref(index: usize) -> TypeRef {
    match index {
        0 => TypeRef::named("i64"),
        1 => TypeRef::named("String"),
        2 => TypeRef::generic("Option", vec![TypeRef::named("u32")]),
        3 => TypeRef::generic("Vec", vec![TypeRef::named("String")]),
        4 => TypeRef::named("Widget"),
        5 => TypeRef::named("HttpContext"),
        6 => TypeRef::reference(TypeRef::named("str")),
        _ => TypeRef::named("bool"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_classification_is_total(
        placeholders in prop::sample::subsequence(PLACEHOLDERS.to_vec(), 0..=4),
        name in prop::sample::select(PARAM_NAMES.to_vec()),
        ty in 0..TYPES.len(),
        attrs in prop::sample::subsequence(vec!["query", "header", "body", "service", "route", "form"], 0..=2),
    ) {
        let structs: Vec<StructDecl> = Vec::new();
        let table = GroupTable::new(&structs);
        let classifier = Classifier::new(
            placeholders.iter().map(|p| p.to_string()).collect(),
            &table,
            4,
        );
        let mut param = ParamDecl::new(name, type_ref(ty));
        for attr in attrs {
            param = param.with_attribute(AttributeDecl::new(attr, vec![]));
        }

        match classifier.classify(&param, "crate::api") {
            ParameterOutcome::Bound(descriptors) => {
                prop_assert_eq!(descriptors.len(), 1);
                prop_assert_eq!(descriptors[0].name.as_str(), name);
            }
            ParameterOutcome::Rejected(diagnostic) => {
                prop_assert_eq!(diagnostic.severity, Severity::Error);
            }
        }
    }

    #[test]
    fn prop_every_handler_is_emitted_or_explained((code, declared) in handler_source("handler")) {
        let output = run_sources(&[("src/api.rs", &code)]);
        let has_error = output.diagnostics.iter().any(|d| d.severity == Severity::Error);
        prop_assert!(output.endpoints.len() == 1 || has_error, "{code}");
        prop_assert!(!(output.endpoints.len() == 1 && has_error), "{code}");
        if let Some(endpoint) = output.endpoints.first() {
            let direct = endpoint.parameters.iter().filter(|p| p.group_path.is_empty()).count();
            prop_assert_eq!(direct, declared);
        }
    }

    #[test]
    fn prop_runs_are_deterministic(
        handlers in prop::collection::vec(handler_source("handler"), 1..5),
        seed in any::<u64>(),
    ) {
        let files: Vec<(String, String)> = handlers
            .into_iter()
            .enumerate()
            .map(|(i, (code, _))| (format!("src/h{i}.rs"), code))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();

        let first = run_sources(&borrowed);
        let second = run_sources(&borrowed);
        prop_assert_eq!(&first, &second);

        let mut rotated = borrowed.clone();
        let shift = (seed as usize) % rotated.len();
        rotated.rotate_left(shift);
        let reordered = run_sources(&rotated);
        prop_assert_eq!(&first.units, &reordered.units);
        prop_assert_eq!(&first.diagnostics, &reordered.diagnostics);
        prop_assert_eq!(&first.endpoints, &reordered.endpoints);
    }

    #[test]
    fn prop_duplicate_original_is_stable(
        noise in prop::collection::vec(handler_source("noise"), 0..4),
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let mut files: Vec<(String, String)> = vec![
            ("src/alpha.rs".into(), "#[get(\"/widgets/{id}\")]\npub fn widget(id: u32) -> ErrorOr<u8> { todo!() }\n".into()),
            ("src/beta.rs".into(), "#[get(\"/widgets/{key}\")]\npub fn widget(key: u32) -> ErrorOr<u8> { todo!() }\n".into()),
        ];
        files.extend(
            noise
                .into_iter()
                .enumerate()
                .map(|(i, (code, _))| (format!("src/noise{i}.rs"), code.replace("/items", "/noise"))),
        );
        let shuffled: Vec<(&str, &str)> = order
            .iter()
            .filter_map(|&i| files.get(i))
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();

        let output = run(&sources(&shuffled), &PipelineSettings::default(), &CancelFlag::new()).unwrap();
        let duplicates: Vec<_> = output
            .diagnostics
            .iter()
            .filter(|d| d.id == DiagnosticId::DuplicateRoute && d.message.contains("/widgets"))
            .collect();
        prop_assert_eq!(duplicates.len(), 1);
        prop_assert_eq!(duplicates[0].location.file.as_str(), "src/beta.rs");
        prop_assert_eq!(
            duplicates[0].related.as_ref().map(|l| l.file.as_str()),
            Some("src/alpha.rs")
        );
    }

    #[test]
    fn prop_implicit_route_and_query_round_trip(
        route_names in prop::sample::subsequence(PLACEHOLDERS.to_vec(), 1..=3),
        query_names in prop::sample::subsequence(vec!["page", "limit", "sort"], 0..=3),
        scalar in prop::sample::select(vec!["i32", "u64", "String", "bool"]),
    ) {
        let mut path = String::from("/things");
        for name in &route_names {
            path.push_str(&format!("/{{{name}}}"));
        }
        let params: Vec<String> = route_names
            .iter()
            .chain(query_names.iter())
            .map(|name| format!("{name}: {scalar}"))
            .collect();
        let code = format!(
            "#[get(\"{path}\")]\npub fn things({}) -> ErrorOr<u8> {{ todo!() }}\n",
            params.join(", ")
        );

        let output = run_sources(&[("src/things.rs", &code)]);
        prop_assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        let text = &output.units[0].text;
        for name in &route_names {
            let expected = format!("request.route::<{scalar}>(\"{name}\")?");
            prop_assert!(text.contains(&expected));
        }
        for name in &query_names {
            let expected = format!("request.query::<{scalar}>(\"{name}\")?");
            prop_assert!(text.contains(&expected));
        }
    }
}

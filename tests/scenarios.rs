//! End-to-end behaviour on small handler sets.

mod common;

use common::{bindings, ids, run_sources, run_with};
use indoc::indoc;
use pretty_assertions::assert_eq;
use routegen::core::BindingSource;
use routegen::{DiagnosticId, PipelineSettings, Severity};

#[test]
fn test_route_and_query_inference() {
    let output = run_sources(&[(
        "src/api/posts.rs",
        indoc! {r#"
            pub struct Posts;

            impl Posts {
                #[get("/users/{id}/posts/{slug}")]
                pub fn get_post(id: i64, slug: String, page: Option<i32>) -> ErrorOr<Post> { todo!() }
            }
        "#},
    )]);

    assert_eq!(output.diagnostics, vec![]);
    assert_eq!(
        bindings(&output),
        vec![
            ("id".to_string(), "ImplicitRoute"),
            ("slug".to_string(), "ImplicitRoute"),
            ("page".to_string(), "ImplicitQuery"),
        ]
    );
    assert_eq!(output.units.len(), 1);
}

#[test]
fn test_unbound_placeholder_blocks_emission() {
    let output = run_sources(&[(
        "src/api/users.rs",
        indoc! {r#"
            #[get("/users/{userId}")]
            pub fn get_user(id: i64) -> ErrorOr<User> { todo!() }
        "#},
    )]);

    assert_eq!(ids(&output.diagnostics), vec![DiagnosticId::RouteParameterNotBound]);
    assert_eq!(output.diagnostics[0].severity, Severity::Error);
    assert!(output.diagnostics[0].message.contains("{userId}"));
    assert!(output.endpoints.is_empty());
    assert!(output.units.is_empty());
}

#[test]
fn test_duplicate_route_keeps_first_registrant() {
    let output = run_sources(&[
        (
            "src/a.rs",
            indoc! {r#"
                pub struct WidgetApi;

                impl WidgetApi {
                    #[get("/widgets/{id}")]
                    pub fn widget(id: u32) -> ErrorOr<Widget> { todo!() }
                }
            "#},
        ),
        (
            "src/b.rs",
            indoc! {r#"
                pub struct LegacyApi;

                impl LegacyApi {
                    #[get("/Widgets/{key}/")]
                    pub fn legacy_widget(key: u32) -> ErrorOr<Widget> { todo!() }
                }
            "#},
        ),
    ]);

    assert_eq!(ids(&output.diagnostics), vec![DiagnosticId::DuplicateRoute]);
    let duplicate = &output.diagnostics[0];
    assert_eq!(duplicate.location.file, "src/b.rs");
    assert!(duplicate.message.contains("crate::a::WidgetApi::widget"));
    assert_eq!(duplicate.related.as_ref().map(|l| l.file.as_str()), Some("src/a.rs"));

    assert_eq!(output.endpoints.len(), 1);
    assert_eq!(output.endpoints[0].method_name, "widget");
}

#[test]
fn test_conflicting_attributes_reject_the_endpoint() {
    let output = run_sources(&[(
        "src/api.rs",
        indoc! {r#"
            #[get("/items")]
            pub fn items(#[query] #[header] filter: String) -> ErrorOr<Vec<Item>> { todo!() }
        "#},
    )]);

    assert_eq!(ids(&output.diagnostics), vec![DiagnosticId::ConflictingBindingAttributes]);
    assert!(output.endpoints.is_empty());
}

#[test]
fn test_instance_handler_is_rejected() {
    let output = run_sources(&[(
        "src/api.rs",
        indoc! {r#"
            pub struct Api;

            impl Api {
                #[get("/ping")]
                pub fn ping(&self) -> ErrorOr<String> { todo!() }
            }
        "#},
    )]);

    assert_eq!(ids(&output.diagnostics), vec![DiagnosticId::NonStaticHandler]);
    assert!(output.endpoints.is_empty());
    assert!(output.units.is_empty());
}

#[test]
fn test_errors_are_isolated_per_handler() {
    let output = run_sources(&[(
        "src/api.rs",
        indoc! {r#"
            pub struct Api;

            impl Api {
                #[get("/ok/{id}")]
                pub fn ok(id: u64) -> ErrorOr<u8> { todo!() }

                #[get("/bad")]
                pub fn bad(thing: Widget) -> ErrorOr<u8> { todo!() }
            }
        "#},
    )]);

    assert_eq!(ids(&output.diagnostics), vec![DiagnosticId::AmbiguousParameter]);
    assert_eq!(output.endpoints.len(), 1);
    assert_eq!(output.endpoints[0].method_name, "ok");
}

#[test]
fn test_parameter_groups_flatten() {
    let output = run_sources(&[(
        "src/api.rs",
        indoc! {r#"
            pub struct Paging {
                page: Option<u32>,
                #[header("X-Page-Size")]
                size: Option<u32>,
            }

            pub struct ListArgs {
                #[route]
                tenant: String,
                #[group]
                paging: Paging,
            }

            #[get("/tenants/{tenant}/orders")]
            pub fn orders(#[group] args: ListArgs) -> ErrorOr<Vec<Order>> { todo!() }
        "#},
    )]);

    assert_eq!(output.diagnostics, vec![]);
    assert_eq!(
        bindings(&output),
        vec![
            ("args".to_string(), "ParameterGroup"),
            ("tenant".to_string(), "ExplicitRoute"),
            ("paging".to_string(), "ParameterGroup"),
            ("page".to_string(), "ImplicitQuery"),
            ("size".to_string(), "ExplicitHeader"),
        ]
    );
    let text = &output.units[0].text;
    assert!(text.contains(
        "ListArgs { tenant: arg1_tenant, paging: Paging { page: arg3_page, size: arg4_size } }"
    ));
}

#[test]
fn test_disabled_configuration_emits_nothing() {
    let settings = PipelineSettings {
        enabled: false,
        ..PipelineSettings::default()
    };
    let output = run_with(
        &[("src/api.rs", "#[get(\"/x\")] pub fn x(&self) -> u8 { 0 }")],
        &settings,
    );
    assert!(output.diagnostics.is_empty());
    assert!(output.units.is_empty());
}

#[test]
fn test_explicit_route_name_uses_placeholder_spelling() {
    let output = run_sources(&[(
        "src/api/users.rs",
        indoc! {r#"
            pub struct UserApi;

            impl UserApi {
                #[get("/users/{userId}")]
                pub fn get_user(#[route("userid")] id: u64) -> ErrorOr<User> { todo!() }
            }
        "#},
    )]);

    assert_eq!(output.diagnostics, vec![]);
    assert_eq!(
        output.endpoints[0].parameters[0].source,
        BindingSource::ExplicitRoute {
            name: "userId".into()
        }
    );
    let text = &output.units[0].text;
    assert!(text.contains(r#"let arg_id: u64 = request.route::<u64>("userId")?;"#));
    assert!(!text.contains(r#""userid""#));
}

#[test]
fn test_optional_upload_binds_without_attribute() {
    let output = run_sources(&[(
        "src/api/avatars.rs",
        indoc! {r#"
            #[put("/avatars/{id}")]
            pub async fn upload(id: u64, avatar: Option<FormFile>, cancel: CancellationToken) -> ErrorOr<()> {
                todo!()
            }
        "#},
    )]);

    assert_eq!(output.diagnostics, vec![]);
    assert_eq!(
        bindings(&output),
        vec![
            ("id".to_string(), "ImplicitRoute"),
            ("avatar".to_string(), "SpecialType"),
            ("cancel".to_string(), "SpecialType"),
        ]
    );
    assert!(output.units[0]
        .text
        .contains(r#"let arg_avatar: Option<FormFile> = request.form_file("avatar").await.ok();"#));
}

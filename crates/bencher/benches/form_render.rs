use bencher::{TestCase, TestFile};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_mvc::discovery::ClassRegistry;
use micro_mvc::form::{ActionForm, FieldDefinition, FieldKind, FormClass, FormHelper, RenderParams};
use micro_mvc::service::builtin_classes;
use micro_mvc::settings::DEFAULT_FORM_CLASS;
use micro_mvc::{AppSettings, Kernel, RequestParams};
use std::hint::black_box;

static LOGIN_SMALL: TestFile = TestFile::new("login_small.txt", include_str!("../resources/params/login_small.txt"));
static PROFILE_LARGE: TestFile =
    TestFile::new("profile_large.txt", include_str!("../resources/params/profile_large.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::small("login", LOGIN_SMALL), TestCase::large("user_profile", PROFILE_LARGE)]
}

fn kernel() -> Kernel {
    let mut registry = ClassRegistry::new();
    for class in builtin_classes() {
        registry.register(class);
    }
    registry.register(FormClass::new(DEFAULT_FORM_CLASS, |_| ActionForm::new()));

    Kernel::builder()
        .settings(AppSettings::builder("bench").build())
        .resolver(registry)
        .build()
        .expect("kernel should build with settings and resolver")
}

fn profile_form() -> ActionForm {
    ActionForm::new()
        .with_field(FieldDefinition::new("user", FieldKind::Text).label("User"))
        .with_field(FieldDefinition::new("email", FieldKind::Email))
        .with_field(FieldDefinition::new("bio", FieldKind::Textarea))
        .with_field(FieldDefinition::new("tag", FieldKind::Text).repeated())
        .with_field(
            FieldDefinition::new("color", FieldKind::Checkbox)
                .repeated()
                .options([("red", "Red"), ("green", "Green"), ("blue", "Blue"), ("cyan", "Cyan"), ("magenta", "Magenta")]),
        )
        .with_field(FieldDefinition::new("remember", FieldKind::Checkbox).options([("1", "Remember me")]))
        .with_field(
            FieldDefinition::new("country", FieldKind::Select).options([("jp", "Japan"), ("fr", "France"), ("br", "Brazil")]),
        )
}

fn benchmark_request_params(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("request_params");

    for case in create_test_cases() {
        group.throughput(Throughput::Bytes(case.query().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            b.iter(|| {
                let params = RequestParams::from_query(black_box(case.query())).expect("query should be urlencoded");
                black_box(params.action_name());
            });
        });
    }

    group.finish();
}

fn benchmark_render_field(criterion: &mut Criterion) {
    let kernel = kernel();
    let mut group = criterion.benchmark_group("render_field");

    for case in create_test_cases() {
        let params = RequestParams::from_query(case.query()).expect("query should be urlencoded");
        let mut form = profile_form();
        form.bind(&params);

        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &form, |b, form| {
            b.iter_batched_ref(
                || {
                    let mut helper = FormHelper::new(kernel.new_backend());
                    helper.add_form("profile", form.clone());
                    helper
                },
                |helper| {
                    let mut html = String::new();
                    for field in ["user", "email", "bio", "color", "remember", "country"] {
                        html.push_str(&helper.render_field(field, Some("profile"), RenderParams::new()));
                    }
                    for _ in 0..8 {
                        html.push_str(&helper.render_field("tag", Some("profile"), RenderParams::new()));
                    }
                    black_box(html);
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(form_render, benchmark_request_params, benchmark_render_field);
criterion_main!(form_render);

use criterion::{criterion_group, criterion_main, Criterion};
use spellclass::{ClassifierRegistry, ClassifierSettings, TextClassifier};

fn generate_csharp_source(classes: usize) -> String {
    let mut source = String::from("using System;\n\nnamespace Sample\n{\n");
    for i in 0..classes {
        source.push_str(&format!(
            r#"    /// <summary>
    /// Handles requests for the <see cref="Service{i}"/> endpoint.
    /// </summary>
    public class Service{i}
    {{
        #region Fields
        private readonly string _name = "Service number {i}";
        #endregion

        // Returns a greeting for the caller
        public string Greet(string user) => $"Hello {{user}}, welcome back";

        /* Legacy path kept for older clients */
        public string Path => @"C:\data\service{i}";
    }}

"#
        ));
    }
    source.push_str("}\n");
    source
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    group.sample_size(20);

    let registry = ClassifierRegistry::builtin();
    let settings = ClassifierSettings::default();
    let content = generate_csharp_source(200);

    group.bench_function("csharp", |b| {
        b.iter(|| {
            let mut classifier = registry
                .create("CSharp", "cs", &settings)
                .expect("CSharp classifier");
            let spans = classifier.parse(std::hint::black_box(&content));
            std::hint::black_box(spans);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);

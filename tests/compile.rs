//! Black-box pipeline tests: feed source text straight through `Compiler::compile` via an inline
//! root source (and, for the import test, an inline import source too) and check the resulting
//! diagnostics, mirroring the six end-to-end scenarios the rule table is built around.

use std::path::Path;

use idlc::compiler::Compiler;
use idlc::diagnostics::{Code, Severity};
use idlc::generator::GeneratorKind;
use idlc::options::{InlineSource, Options};

fn compile_with(sources: Vec<(&str, &str)>) -> idlc::compiler::CompilationResult {
    let inline = sources
        .into_iter()
        .map(|(name, text)| InlineSource { name: name.to_string(), bytes: text.as_bytes().to_vec() })
        .collect();
    let mut options = Options::new();
    options.set_inline_sources(inline);
    Compiler::new(options).compile(Path::new(""))
}

fn compile(src: &str) -> idlc::compiler::CompilationResult {
    compile_with(vec![("root.idl", src)])
}

fn codes(result: &idlc::compiler::CompilationResult) -> Vec<Code> {
    result.diagnostics.iter().map(|d| d.code).collect()
}

#[test]
fn minimal_api_compiles_clean() {
    let src = r#"
        /// brief: a minimal api
        api Minimal {
            /// brief: a func that adds two numbers
            [type(Int32)]
            func Add([type(Int32)] a, [type(Int32)] b);
        }
    "#;
    let result = compile(src);
    assert!(!result.has_errors(false), "unexpected diagnostics: {:?}", codes(&result));
    assert!(result.context.api().is_some());
}

#[test]
fn enum_bit_flags_round_trip() {
    let src = r#"
        /// brief: a flags api
        api Flags {
            /// brief: permission bits
            [flags]
            enum Permission {
                /// brief: none
                [value(0)]
                None,
                /// brief: read
                [value(1)]
                Read,
                /// brief: write
                [value(2)]
                Write,
                /// brief: both
                [value(3)]
                ReadWrite,
            }
        }
    "#;
    let result = compile(src);
    assert!(!result.has_errors(false), "unexpected diagnostics: {:?}", codes(&result));
}

#[test]
fn property_type_mismatch_is_rejected() {
    let src = r#"
        /// brief: mismatched property api
        api Mismatch {
            /// brief: backing data
            [handle]
            struct WidgetData {
                /// brief: a field
                [type(Int32)]
                dummy;
            }

            /// brief: a widget
            [type(WidgetData)]
            interface Widget {
                /// brief: returns the name
                [type(Str)]
                method GetName([this] self);

                /// brief: sets the name
                method SetName([this] self, [type(Str)] value);

                /// brief: a mis-typed property
                [type(Int32), get(GetName), set(SetName)]
                property Name;
            }
        }
    "#;
    let result = compile(src);
    assert!(codes(&result).contains(&Code::E2065), "expected E2065, got {:?}", codes(&result));
}

#[test]
fn import_cycle_is_detected_and_harmless() {
    let a = r#"
        import "b";
        /// brief: api a
        api A {
            /// brief: a func
            func Noop();
        }
    "#;
    let b = r#"
        import "a";
    "#;
    let result = compile_with(vec![("a.idl", a), ("b", b)]);
    assert!(!result.has_errors(false), "cyclic import should be a no-op, got {:?}", codes(&result));
    assert!(result.context.api().is_some());
}

#[test]
fn case_sensitive_type_reference_is_rejected() {
    let src = r#"
        /// brief: case sensitivity api
        api CaseSensitive {
            /// brief: a struct
            struct Point {
                /// brief: x
                [type(Int32)]
                x;
            }

            /// brief: a func using the wrong case
            func UsePoint([type(point)] p);
        }
    "#;
    let result = compile(src);
    assert!(codes(&result).contains(&Code::E2037), "expected E2037, got {:?}", codes(&result));
}

#[test]
fn missing_import_reports_e2041() {
    let src = r#"
        import "does_not_exist";
        /// brief: api
        api Gone {
            /// brief: a func
            func Noop();
        }
    "#;
    let result = compile(src);
    assert!(codes(&result).contains(&Code::E2041), "expected E2041, got {:?}", codes(&result));
}

#[test]
fn undocumented_declaration_is_rejected() {
    let src = r#"
        /// brief: an api
        api NoDocs {
            func Noop();
        }
    "#;
    let result = compile(src);
    assert!(codes(&result).contains(&Code::E2005), "expected E2005, got {:?}", codes(&result));
}

#[test]
fn missing_author_and_copyright_warn_on_api_only() {
    let src = r#"
        /// brief: an api with no author or copyright
        api Bare {
            /// brief: a func
            func Noop();
        }
    "#;
    let result = compile(src);
    assert!(!result.has_errors(false));
    let warnings: Vec<Code> = result.diagnostics.iter().filter(|d| d.severity == Severity::Warning).map(|d| d.code).collect();
    assert!(warnings.contains(&Code::W1001));
    assert!(warnings.contains(&Code::W1002));
}

#[test]
fn warnings_as_errors_promotes_w1001() {
    let src = r#"
        /// brief: an api with no author or copyright
        api Bare {
            /// brief: a func
            func Noop();
        }
    "#;
    let inline = vec![InlineSource { name: "root.idl".to_string(), bytes: src.as_bytes().to_vec() }];
    let mut options = Options::new();
    options.set_inline_sources(inline);
    options.set_warnings_as_errors(true);
    let result = Compiler::new(options).compile(Path::new(""));
    assert!(result.has_errors(true));
    assert!(!result.has_errors(false));
}

#[test]
fn trailing_inline_doc_satisfies_documentation_completeness() {
    let src = r#"
        /// brief: an api exercising trailing documentation
        api Docs {
            /// brief: a point
            struct Point {
                [type(Int32)]
                x; /// detail: the x coordinate
                [type(Int32)]
                y; /// detail: the y coordinate
            }
        }
    "#;
    let result = compile(src);
    assert!(!result.has_errors(false), "unexpected diagnostics: {:?}", codes(&result));
}

#[test]
fn combining_block_and_trailing_doc_is_rejected() {
    let src = r#"
        /// brief: an api exercising trailing documentation
        api Docs {
            /// brief: a point
            struct Point {
                /// brief: the x coordinate
                [type(Int32)]
                x; /// detail: redundant trailing form
                /// brief: the y coordinate
                [type(Int32)]
                y;
            }
        }
    "#;
    let result = compile(src);
    assert!(codes(&result).contains(&Code::E2021), "expected E2021: {:?}", codes(&result));
}

#[test]
fn c_generator_emits_a_typedef_for_every_struct() {
    let src = r#"
        /// brief: api
        api Geometry {
            /// brief: a point
            struct Point {
                /// brief: x
                [type(Int32)]
                x;
                /// brief: y
                [type(Int32)]
                y;
            }
        }
    "#;
    let result = compile(src);
    assert!(!result.has_errors(false), "unexpected diagnostics: {:?}", codes(&result));
    let rendered = result.generate(GeneratorKind::C).expect("generation should succeed on a clean context");
    assert!(rendered.contains("Point_t"));
}

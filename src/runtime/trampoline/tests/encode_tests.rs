use super::encode_trampoline_module;
use crate::runtime::trampoline::signature::Signature;
use crate::settings::{TRAMPOLINE_FIELD, TRAMPOLINE_IMPORT_MODULE};
use wasmparser::{Parser, Payload};
use wasmtime::{Engine, ExternType, Module, ValType};

#[test]
fn encoded_module_has_one_import_and_one_export() {
    let signature = Signature::parse("iii").unwrap();
    let bytes = encode_trampoline_module(&signature).unwrap();

    let engine = Engine::default();
    let module = Module::new(&engine, &bytes).expect("trampoline module compiles");

    let imports: Vec<_> = module.imports().collect();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].module(), TRAMPOLINE_IMPORT_MODULE);
    assert_eq!(imports[0].name(), TRAMPOLINE_FIELD);

    match imports[0].ty() {
        ExternType::Func(func_type) => {
            assert_eq!(func_type.params().len(), 2);
            assert!(func_type.params().all(|ty| matches!(ty, ValType::I32)));
            assert!(matches!(func_type.results().next(), Some(ValType::I32)));
        }
        other => panic!("expected a function import, got {:?}", other),
    }

    let exports: Vec<_> = module.exports().map(|export| export.name().to_owned()).collect();
    assert_eq!(exports, vec![TRAMPOLINE_FIELD.to_owned()]);
}

#[test]
fn encoded_module_has_no_code() {
    let bytes = encode_trampoline_module(&Signature::parse("vjfd").unwrap()).unwrap();
    let mut type_sections = 0;

    for payload in Parser::new(0).parse_all(&bytes) {
        match payload.expect("valid payload") {
            Payload::TypeSection(reader) => {
                type_sections += 1;
                assert_eq!(reader.count(), 1);
            }
            Payload::FunctionSection(_) | Payload::CodeSectionStart { .. } => {
                panic!("trampoline modules define no functions of their own")
            }
            _ => {}
        }
    }

    assert_eq!(type_sections, 1);
}

#[test]
fn every_value_kind_encodes_a_valid_module() {
    for descriptor in ["v", "i", "j", "f", "d", "vi", "jjjj", "dfji", "fp"] {
        let signature = Signature::parse(descriptor).unwrap();
        let bytes = encode_trampoline_module(&signature).unwrap();
        wasmparser::validate(&bytes).expect(descriptor);
    }
}

//! Binding keys.
//!
//! A key is a stable textual identifier of a declaration that survives
//! across resolution sessions:
//!
//! | binding          | key                      |
//! |------------------|--------------------------|
//! | type             | `Lp/Outer$Inner;`        |
//! | primitive, array | `I`, `[[I`               |
//! | parameterized    | `Lp/Box<Ljava/lang/String;>;` |
//! | method           | `Lp/Foo;.bar(I)V`        |
//! | constructor      | `Lp/Foo;.(I)V`           |
//! | field            | `Lp/Foo;.x)I`            |
//! | parameter, local | `Lp/Foo;.bar(I)V#x`      |
//! | package          | `p.q`                    |
//! | module           | `"name`                  |
//! | annotation       | `<owner>@<type>`         |
//! | member value     | `<annotation>.name`      |

use crate::model::{InternalRef, MethodId, SemanticModel, TypeId, TypeKind, VarOwner};

/// JVM descriptor letter of a primitive type name.
pub fn primitive_descriptor(name: &str) -> Option<char> {
    let letter = match name {
        "boolean" => 'Z',
        "byte" => 'B',
        "char" => 'C',
        "short" => 'S',
        "int" => 'I',
        "long" => 'J',
        "float" => 'F',
        "double" => 'D',
        "void" => 'V',
        _ => return None,
    };
    Some(letter)
}

pub fn type_key(model: &SemanticModel, id: TypeId) -> String {
    let mut out = String::new();
    write_type_key(model, id, &mut out);
    out
}

fn write_type_key(model: &SemanticModel, id: TypeId, out: &mut String) {
    let data = model.ty(id);
    if let Some((element, dims)) = data.element {
        out.push_str(&"[".repeat(dims as usize));
        write_type_key(model, element, out);
        return;
    }
    if data.kind == TypeKind::Primitive {
        match primitive_descriptor(&data.name) {
            Some(letter) => out.push(letter),
            None => out.push_str(&data.name),
        }
        return;
    }
    out.push('L');
    out.push_str(&binary_name(model, id));
    if !data.type_arguments.is_empty() {
        out.push('<');
        for arg in &data.type_arguments {
            write_type_key(model, *arg, out);
        }
        out.push('>');
    }
    out.push(';');
}

/// `p/q/Outer$Inner`.
fn binary_name(model: &SemanticModel, id: TypeId) -> String {
    let data = model.ty(id);
    match (data.outer, data.package) {
        (Some(outer), _) => format!("{}${}", binary_name(model, outer), data.name),
        (None, Some(package)) if !model.package(package).name.is_empty() => {
            format!("{}/{}", model.package(package).name.replace('.', "/"), data.name)
        }
        _ => data.name.to_string(),
    }
}

pub fn method_key(model: &SemanticModel, id: MethodId) -> String {
    let data = model.method(id);
    let mut out = type_key(model, data.declaring_type);
    out.push('.');
    if !data.is_constructor() {
        out.push_str(&data.name);
    }
    out.push('(');
    for param in &data.params {
        write_type_key(model, model.variable(*param).ty, &mut out);
    }
    out.push(')');
    match data.return_type {
        Some(ret) => write_type_key(model, ret, &mut out),
        None => out.push('V'),
    }
    out
}

/// Key of any internal object.
pub fn internal_key(model: &SemanticModel, internal: InternalRef) -> String {
    match internal {
        InternalRef::Type(id) => type_key(model, id),
        InternalRef::Method(id) => method_key(model, id),
        InternalRef::Variable(id) => {
            let data = model.variable(id);
            match data.owner {
                VarOwner::Field(owner) => {
                    format!("{}.{}){}", type_key(model, owner), data.name, type_key(model, data.ty))
                }
                VarOwner::Parameter(method) | VarOwner::Local(method) => {
                    format!("{}#{}", method_key(model, method), data.name)
                }
            }
        }
        InternalRef::Package(id) => model.package(id).name.to_string(),
        InternalRef::Module(id) => format!("\"{}", model.module(id).name),
        InternalRef::Annotation(id) => {
            let data = model.annotation(id);
            format!("{}@{}", internal_key(model, data.owner), type_key(model, data.ty))
        }
        InternalRef::MemberValuePair { annotation, index } => {
            let name = model
                .annotation(annotation)
                .pairs
                .get(index as usize)
                .map(|(name, _)| name.as_str())
                .unwrap_or_default();
            format!("{}.{name}", internal_key(model, InternalRef::Annotation(annotation)))
        }
    }
}

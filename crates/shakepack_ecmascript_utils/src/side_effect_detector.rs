use oxc::{
  ast::ast::{
    ArrayExpressionElement, BinaryOperator, BindingPatternKind, Class, ClassElement, Expression,
    IdentifierReference, ObjectPropertyKind, PropertyKey, Statement, UnaryOperator,
    VariableDeclaration,
  },
  semantic::Scoping,
};
use phf::{phf_map, phf_set};

/// Static methods that neither mutate global state nor perform I/O.
static KNOWN_PURE_FUNCTIONS: phf::Map<&'static str, phf::Set<&'static str>> = phf_map! {
  "Math" => phf_set! {
    "abs", "acos", "acosh", "asin", "asinh", "atan", "atan2", "atanh", "cbrt", "ceil",
    "clz32", "cos", "cosh", "exp", "expm1", "floor", "fround", "hypot", "imul", "log",
    "log10", "log1p", "log2", "max", "min", "pow", "round", "sign", "sin", "sinh",
    "sqrt", "tan", "tanh", "trunc",
  },
  "String" => phf_set! { "fromCharCode", "fromCodePoint", "raw" },
  "Number" => phf_set! { "isFinite", "isInteger", "isNaN", "isSafeInteger", "parseFloat", "parseInt" },
  "Object" => phf_set! {
    "create", "freeze", "keys", "values", "entries", "getOwnPropertyNames", "getPrototypeOf", "is",
  },
  "Array" => phf_set! { "isArray", "from", "of" },
  "Symbol" => phf_set! { "for", "keyFor" },
};

static KNOWN_PURE_GLOBAL_FUNCTIONS: phf::Set<&'static str> = phf_set! {
  "String", "Number", "Symbol", "Boolean", "isNaN", "isFinite", "parseInt", "parseFloat",
  "decodeURI", "decodeURIComponent",
};

static KNOWN_PURE_CONSTRUCTORS: phf::Set<&'static str> = phf_set! {
  "Set", "Map", "WeakSet", "WeakMap", "RegExp", "Array", "Object", "Date", "Error", "TypeError",
  "RangeError", "SyntaxError", "ReferenceError", "Promise", "ArrayBuffer", "URL", "URLSearchParams",
  "Uint8Array", "Int32Array", "Float64Array",
};

/// Globals that are always defined, so reading them can't throw.
static KNOWN_GLOBALS: phf::Set<&'static str> = phf_set! {
  "undefined", "NaN", "Infinity", "Math", "Object", "Array", "String", "Number", "Boolean",
  "Symbol", "JSON", "Reflect", "Promise", "Map", "Set", "WeakMap", "WeakSet", "Date", "Error",
  "RegExp", "globalThis",
};

/// Conservative purity check for top-level code: anything it can't prove pure counts as a side effect.
pub struct SideEffectDetector<'s> {
  scoping: &'s Scoping,
}

impl<'s> SideEffectDetector<'s> {
  pub fn new(scoping: &'s Scoping) -> Self {
    Self { scoping }
  }

  fn is_unresolved(&self, ident: &IdentifierReference) -> bool {
    ident
      .reference_id
      .get()
      .is_none_or(|reference_id| self.scoping.get_reference(reference_id).symbol_id().is_none())
  }

  fn is_known_global(&self, expr: &Expression, names: &phf::Set<&'static str>) -> bool {
    matches!(expr, Expression::Identifier(ident)
      if names.contains(ident.name.as_str()) && self.is_unresolved(ident))
  }

  pub fn detect_side_effect_of_stmt(&self, stmt: &Statement) -> bool {
    match stmt {
      Statement::EmptyStatement(_)
      | Statement::FunctionDeclaration(_)
      | Statement::TSTypeAliasDeclaration(_)
      | Statement::TSInterfaceDeclaration(_) => false,
      Statement::VariableDeclaration(decl) => self.detect_side_effect_of_var_decl(decl),
      Statement::ClassDeclaration(class) => self.detect_side_effect_of_class(class),
      Statement::ExpressionStatement(stmt) => self.detect_side_effect_of_expr(&stmt.expression),
      _ => true,
    }
  }

  pub fn detect_side_effect_of_var_decl(&self, decl: &VariableDeclaration) -> bool {
    decl.declarations.iter().any(|declarator| {
      // Destructuring runs getters and iterators.
      !matches!(declarator.id.kind, BindingPatternKind::BindingIdentifier(_))
        || declarator.init.as_ref().is_some_and(|init| self.detect_side_effect_of_expr(init))
    })
  }

  pub fn detect_side_effect_of_class(&self, class: &Class) -> bool {
    if !class.decorators.is_empty() {
      return true;
    }
    if class.super_class.as_ref().is_some_and(|super_class| self.detect_side_effect_of_expr(super_class)) {
      return true;
    }
    class.body.body.iter().any(|element| match element {
      ClassElement::StaticBlock(block) => !block.body.is_empty(),
      ClassElement::MethodDefinition(method) => {
        !method.decorators.is_empty() || self.detect_side_effect_of_property_key(&method.key)
      }
      ClassElement::PropertyDefinition(prop) => {
        !prop.decorators.is_empty()
          || self.detect_side_effect_of_property_key(&prop.key)
          || (prop.r#static
            && prop.value.as_ref().is_some_and(|value| self.detect_side_effect_of_expr(value)))
      }
      ClassElement::AccessorProperty(prop) => {
        !prop.decorators.is_empty()
          || self.detect_side_effect_of_property_key(&prop.key)
          || (prop.r#static
            && prop.value.as_ref().is_some_and(|value| self.detect_side_effect_of_expr(value)))
      }
      ClassElement::TSIndexSignature(_) => false,
    })
  }

  fn detect_side_effect_of_property_key(&self, key: &PropertyKey) -> bool {
    key.as_expression().is_some_and(|expr| self.detect_side_effect_of_expr(expr))
  }

  pub fn detect_side_effect_of_expr(&self, expr: &Expression) -> bool {
    match expr {
      Expression::BooleanLiteral(_)
      | Expression::NullLiteral(_)
      | Expression::NumericLiteral(_)
      | Expression::BigIntLiteral(_)
      | Expression::RegExpLiteral(_)
      | Expression::StringLiteral(_)
      | Expression::FunctionExpression(_)
      | Expression::ArrowFunctionExpression(_)
      | Expression::ThisExpression(_) => false,
      Expression::TemplateLiteral(tpl) => {
        tpl.expressions.iter().any(|expr| self.detect_side_effect_of_expr(expr))
      }
      Expression::Identifier(ident) => {
        self.is_unresolved(ident) && !KNOWN_GLOBALS.contains(ident.name.as_str())
      }
      Expression::ParenthesizedExpression(paren) => self.detect_side_effect_of_expr(&paren.expression),
      Expression::ClassExpression(class) => self.detect_side_effect_of_class(class),
      Expression::UnaryExpression(unary) => match unary.operator {
        UnaryOperator::Delete => true,
        // `typeof` never throws, even on undeclared globals.
        UnaryOperator::Typeof if matches!(unary.argument, Expression::Identifier(_)) => false,
        _ => self.detect_side_effect_of_expr(&unary.argument),
      },
      Expression::BinaryExpression(binary) => {
        matches!(binary.operator, BinaryOperator::In | BinaryOperator::Instanceof)
          || self.detect_side_effect_of_expr(&binary.left)
          || self.detect_side_effect_of_expr(&binary.right)
      }
      Expression::LogicalExpression(logical) => {
        self.detect_side_effect_of_expr(&logical.left) || self.detect_side_effect_of_expr(&logical.right)
      }
      Expression::ConditionalExpression(cond) => {
        self.detect_side_effect_of_expr(&cond.test)
          || self.detect_side_effect_of_expr(&cond.consequent)
          || self.detect_side_effect_of_expr(&cond.alternate)
      }
      Expression::SequenceExpression(seq) => {
        seq.expressions.iter().any(|expr| self.detect_side_effect_of_expr(expr))
      }
      Expression::ArrayExpression(array) => array.elements.iter().any(|element| match element {
        ArrayExpressionElement::SpreadElement(_) => true,
        ArrayExpressionElement::Elision(_) => false,
        element => element.as_expression().is_none_or(|expr| self.detect_side_effect_of_expr(expr)),
      }),
      Expression::ObjectExpression(object) => object.properties.iter().any(|prop| match prop {
        ObjectPropertyKind::ObjectProperty(prop) => {
          self.detect_side_effect_of_property_key(&prop.key)
            || self.detect_side_effect_of_expr(&prop.value)
        }
        ObjectPropertyKind::SpreadProperty(_) => true,
      }),
      Expression::StaticMemberExpression(member) => {
        !self.is_known_global(&member.object, &KNOWN_GLOBALS)
          || !KNOWN_PURE_FUNCTIONS.contains_key(member_object_name(&member.object))
      }
      Expression::CallExpression(call) => {
        let callee_is_pure = call.pure
          || self.is_known_global(&call.callee, &KNOWN_PURE_GLOBAL_FUNCTIONS)
          || match &call.callee {
            Expression::StaticMemberExpression(member) => {
              self.is_known_global(&member.object, &KNOWN_GLOBALS)
                && KNOWN_PURE_FUNCTIONS
                  .get(member_object_name(&member.object))
                  .is_some_and(|methods| methods.contains(member.property.name.as_str()))
            }
            _ => false,
          };
        !callee_is_pure
          || call
            .arguments
            .iter()
            .any(|arg| arg.as_expression().is_none_or(|expr| self.detect_side_effect_of_expr(expr)))
      }
      Expression::NewExpression(new) => {
        let callee_is_pure = new.pure || self.is_known_global(&new.callee, &KNOWN_PURE_CONSTRUCTORS);
        !callee_is_pure
          || new
            .arguments
            .iter()
            .any(|arg| arg.as_expression().is_none_or(|expr| self.detect_side_effect_of_expr(expr)))
      }
      _ => true,
    }
  }
}

fn member_object_name<'e>(expr: &'e Expression) -> &'e str {
  match expr {
    Expression::Identifier(ident) => ident.name.as_str(),
    _ => "",
  }
}

#[cfg(test)]
mod tests {
  use oxc::{allocator::Allocator, parser::Parser, semantic::SemanticBuilder, span::SourceType};

  use super::*;

  /// Only the last statement is checked, the ones before it set up bindings.
  fn has_side_effects(code: &str) -> bool {
    let allocator = Allocator::default();
    let program = Parser::new(&allocator, code, SourceType::mjs()).parse().program;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let detector = SideEffectDetector::new(&scoping);
    program.body.last().is_some_and(|stmt| detector.detect_side_effect_of_stmt(stmt))
  }

  #[test]
  fn literals_and_functions_are_pure() {
    assert!(!has_side_effects("const a = 1, b = 'x', c = `t`, d = /re/g, e = null;"));
    assert!(!has_side_effects("function f() { sideEffect(); }"));
    assert!(!has_side_effects("const f = () => sideEffect();"));
    assert!(!has_side_effects("const o = { a: 1, b: [1, 2], c() {} };"));
    assert!(!has_side_effects("let a; const b = a;"));
  }

  #[test]
  fn calls_are_effectful_unless_known_or_annotated() {
    assert!(has_side_effects("const a = sideEffect();"));
    assert!(!has_side_effects("const a = /*#__PURE__*/ create();"));
    assert!(!has_side_effects("const a = Math.max(1, 2);"));
    assert!(!has_side_effects("const a = new Map();"));
    assert!(has_side_effects("const a = new Foo();"));
  }

  #[test]
  fn shadowed_globals_are_not_trusted() {
    assert!(has_side_effects("import { Math } from './m'; const a = Math.max(1, 2);"));
  }

  #[test]
  fn classes() {
    assert!(!has_side_effects("class A { static a = 1; b = effect(); }"));
    assert!(has_side_effects("class A { static a = effect(); }"));
    assert!(has_side_effects("class A extends effect() {}"));
    assert!(has_side_effects("class A { static { effect(); } }"));
  }

  #[test]
  fn misc_expressions() {
    assert!(has_side_effects("const a = unknownGlobal;"));
    assert!(!has_side_effects("const a = typeof unknownGlobal;"));
    assert!(has_side_effects("const { a } = obj;"));
    assert!(has_side_effects("delete obj.a;"));
  }
}

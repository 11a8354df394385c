use oxc::{
  allocator::{Allocator, TakeIn},
  ast::ast::{
    BindingIdentifier, ExportAllDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration,
    IdentifierReference, ImportDeclaration, ImportDeclarationSpecifier, Program, Statement,
  },
  ast_visit::Visit,
};
use rustc_hash::{FxHashMap, FxHashSet};
use shakepack_common::{wrapper_params, AsyncType, Dependency, DependencyKey};
use shakepack_ecmascript_utils::{declaration_names, AstSnippet};
use shakepack_error::{BuildError, BuildResult, SerializeError};
use shakepack_utils::{
  ecmascript::property_access_str, indexmap::FxIndexMap,
  sanitize_file_name::specifier_to_binding_name,
};

use super::factory;

/// A named import. Reads of the local binding become `object.imported`, which keeps the binding
/// live.
#[derive(Debug, Clone)]
pub struct ImportBinding {
  pub object: String,
  pub imported: String,
}

impl ImportBinding {
  pub fn access(&self) -> String {
    property_access_str(&self.object, &self.imported)
  }
}

#[derive(Debug, Default)]
pub struct LoweredModule {
  /// Named imports by local name.
  pub imports: FxHashMap<String, ImportBinding>,
  /// The module used `import` or `export` syntax.
  pub is_esm: bool,
}

/// Turns `import` and `export` declarations into factory code. Export getters go first so
/// circular importers see every export, then the loads in source order, then the rest of the
/// body.
pub struct ModuleLowering<'me, 'ast> {
  snippet: AstSnippet<'ast>,
  module_id: &'me str,
  dependencies: &'me FxIndexMap<DependencyKey, Dependency>,
  taken_names: FxHashSet<String>,
  getters: Vec<String>,
  own_exports: Vec<String>,
  /// Binding of the own export names object, once an `export *` needs it.
  own_exports_binding: Option<String>,
  hoisted: Vec<String>,
  lowered: LoweredModule,
}

impl<'me, 'ast> ModuleLowering<'me, 'ast> {
  pub fn new(
    alloc: &'ast Allocator,
    module_id: &'me str,
    dependencies: &'me FxIndexMap<DependencyKey, Dependency>,
    program: &Program<'ast>,
  ) -> Self {
    let mut taken_names = wrapper_params::ALL.iter().map(ToString::to_string).collect();
    NameCollector { names: &mut taken_names }.visit_program(program);
    Self {
      snippet: AstSnippet::new(alloc),
      module_id,
      dependencies,
      taken_names,
      getters: Vec::new(),
      own_exports: Vec::new(),
      own_exports_binding: None,
      hoisted: Vec::new(),
      lowered: LoweredModule::default(),
    }
  }

  pub fn lower(mut self, program: &mut Program<'ast>) -> BuildResult<LoweredModule> {
    let alloc = self.snippet.alloc();
    let body = program.body.take_in(alloc);
    let mut statements = self.snippet.builder.vec_with_capacity(body.len());

    for stmt in body {
      match stmt {
        Statement::ImportDeclaration(decl) => {
          self.lowered.is_esm = true;
          self.lower_import(&decl)?;
        }
        Statement::ExportNamedDeclaration(decl) => {
          self.lowered.is_esm = true;
          if let Some(stmt) = self.lower_export_named(decl.unbox())? {
            statements.push(stmt);
          }
        }
        Statement::ExportDefaultDeclaration(decl) => {
          self.lowered.is_esm = true;
          if let Some(stmt) = self.lower_export_default(decl.unbox().declaration)? {
            statements.push(stmt);
          }
        }
        Statement::ExportAllDeclaration(decl) => {
          self.lowered.is_esm = true;
          self.lower_export_all(&decl)?;
        }
        stmt => statements.push(stmt),
      }
    }

    let mut prologue = String::new();
    if self.lowered.is_esm {
      prologue.push_str(&factory::es_module_marker());
    }
    let own_exports = self
      .own_exports_binding
      .as_deref()
      .map(|binding| factory::export_names_object(binding, &self.own_exports));
    for line in self.getters.iter().chain(&own_exports).chain(&self.hoisted) {
      prologue.push('\n');
      prologue.push_str(line);
    }
    let mut front = self.snippet.statements(&prologue).map_err(|err| self.codegen_error(&err))?;
    front.extend(statements);
    program.body = front;

    Ok(self.lowered)
  }

  fn export(&mut self, name: &str, value: &str) {
    self.getters.push(factory::export_getter(name, value));
    self.own_exports.push(name.to_string());
  }

  fn codegen_error(&self, err: &anyhow::Error) -> BuildError {
    SerializeError::Codegen { module: self.module_id.to_string(), message: err.to_string() }.into()
  }

  fn dependency_index(&self, source: &str) -> BuildResult<usize> {
    self.dependencies.get_index_of(&DependencyKey::sync(source)).ok_or_else(|| {
      SerializeError::MissingDependency { module: self.module_id.to_string(), key: source.to_string() }
        .into()
    })
  }

  fn fresh_name(&mut self, base: &str) -> String {
    let mut name = base.to_string();
    let mut suffix = 1;
    while self.taken_names.contains(&name) {
      suffix += 1;
      name = format!("{base}{suffix}");
    }
    self.taken_names.insert(name.clone());
    name
  }

  /// `var _x = _$$_REQUIRE(_dependencyMap[i]);` and the binding's name.
  fn require_binding(&mut self, source: &str, index: usize) -> String {
    let object = self.fresh_name(&specifier_to_binding_name(source));
    self.hoisted.push(format!("var {object} = {};", factory::load_expr(AsyncType::None, index)));
    object
  }

  fn lower_import(&mut self, decl: &ImportDeclaration<'ast>) -> BuildResult<()> {
    if decl.import_kind.is_type() {
      return Ok(());
    }
    let source = decl.source.value.as_str();
    let index = self.dependency_index(source)?;
    let specifiers = decl
      .specifiers
      .iter()
      .flatten()
      .filter(|spec| {
        !matches!(spec, ImportDeclarationSpecifier::ImportSpecifier(spec) if spec.import_kind.is_type())
      })
      .collect::<Vec<_>>();

    if specifiers.is_empty() {
      self.hoisted.push(format!("{};", factory::load_expr(AsyncType::None, index)));
      return Ok(());
    }

    let mut object = None;
    for spec in specifiers {
      match spec {
        ImportDeclarationSpecifier::ImportDefaultSpecifier(spec) => {
          self.hoisted.push(format!("var {} = {};", spec.local.name, factory::import_default_expr(index)));
        }
        ImportDeclarationSpecifier::ImportNamespaceSpecifier(spec) => {
          self.hoisted.push(format!("var {} = {};", spec.local.name, factory::import_all_expr(index)));
        }
        ImportDeclarationSpecifier::ImportSpecifier(spec) => {
          let object = match object.clone() {
            Some(object) => object,
            None => {
              let name = self.require_binding(source, index);
              object = Some(name.clone());
              name
            }
          };
          self.lowered.imports.insert(
            spec.local.name.to_string(),
            ImportBinding { object, imported: spec.imported.name().to_string() },
          );
        }
      }
    }
    Ok(())
  }

  fn lower_export_named(
    &mut self,
    decl: ExportNamedDeclaration<'ast>,
  ) -> BuildResult<Option<Statement<'ast>>> {
    if decl.export_kind.is_type() {
      return Ok(None);
    }
    let specifiers = decl.specifiers.iter().filter(|spec| !spec.export_kind.is_type());

    if let Some(source) = &decl.source {
      let index = self.dependency_index(source.value.as_str())?;
      let object = self.require_binding(source.value.as_str(), index);
      for spec in specifiers {
        let value = property_access_str(&object, &spec.local.name());
        self.export(&spec.exported.name(), &value);
      }
      return Ok(None);
    }

    for spec in specifiers {
      self.export(&spec.exported.name(), &spec.local.name());
    }
    let Some(declaration) = decl.declaration else { return Ok(None) };
    for name in declaration_names(&declaration) {
      self.export(name, name);
    }
    Ok(Some(Statement::from(declaration)))
  }

  fn lower_export_default(
    &mut self,
    kind: ExportDefaultDeclarationKind<'ast>,
  ) -> BuildResult<Option<Statement<'ast>>> {
    let stmt = match kind {
      ExportDefaultDeclarationKind::FunctionDeclaration(mut func) => {
        let name = self.declaration_name(&mut func.id);
        self.export("default", &name);
        Statement::FunctionDeclaration(func)
      }
      ExportDefaultDeclarationKind::ClassDeclaration(mut class) => {
        let name = self.declaration_name(&mut class.id);
        self.export("default", &name);
        Statement::ClassDeclaration(class)
      }
      ExportDefaultDeclarationKind::TSInterfaceDeclaration(_) => return Ok(None),
      kind => {
        let name = self.fresh_name("_default");
        self.export("default", &name);
        self
          .snippet
          .var_decl_stmt(&name, kind.into_expression())
          .map_err(|err| self.codegen_error(&err))?
      }
    };
    Ok(Some(stmt))
  }

  /// Anonymous default functions and classes get a name so the getter can reach them.
  fn declaration_name(&mut self, id: &mut Option<BindingIdentifier<'ast>>) -> String {
    if let Some(id) = id {
      return id.name.to_string();
    }
    let name = self.fresh_name("_default");
    *id = Some(self.snippet.id(&name));
    name
  }

  fn lower_export_all(&mut self, decl: &ExportAllDeclaration<'ast>) -> BuildResult<()> {
    if decl.export_kind.is_type() {
      return Ok(());
    }
    let source = decl.source.value.as_str();
    let index = self.dependency_index(source)?;
    match &decl.exported {
      Some(exported) => {
        let object = self.fresh_name(&specifier_to_binding_name(source));
        self.hoisted.push(format!("var {object} = {};", factory::import_all_expr(index)));
        self.export(&exported.name(), &object);
      }
      None => {
        let object = self.require_binding(source, index);
        let own_names = match self.own_exports_binding.clone() {
          Some(binding) => binding,
          None => {
            let binding = self.fresh_name("_exportNames");
            self.own_exports_binding = Some(binding.clone());
            binding
          }
        };
        self.hoisted.push(factory::export_star_loop(&object, &own_names));
      }
    }
    Ok(())
  }
}

/// Every identifier in the module, so generated bindings never shadow or collide with one.
struct NameCollector<'n> {
  names: &'n mut FxHashSet<String>,
}

impl<'ast> Visit<'ast> for NameCollector<'_> {
  fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'ast>) {
    self.names.insert(ident.name.to_string());
  }

  fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'ast>) {
    self.names.insert(ident.name.to_string());
  }
}

use super::{Error, Result};
use crate::{
    ast::{self, ROOT},
    expression::{HostType, ParameterExpression, ParameterId},
    options::{ServerVersion, TranslationOptions},
    serializer::{SerializerRef, SerializerRegistry},
};
use lazy_static::lazy_static;
use regex::Regex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

lazy_static! {
    // matches ASCII characters that are not word characters ([0-9A-Za-z_])
    static ref ILLEGAL_VARIABLE_CHARACTERS: Option<Regex> =
        Regex::new(r"[[:ascii:]&&[:^word:]]").ok();
}

/// Variables the server defines or that `$reduce` binds implicitly.
const RESERVED_VARIABLE_NAMES: [&str; 5] = [ROOT, "CURRENT", "NOW", "this", "value"];

/// What a lambda parameter stands for in the translated query.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub parameter_name: String,
    /// The variable or field path the parameter translates to.
    pub ast: ast::Expression,
    pub serializer: SerializerRef,
    /// The parameter is the document flowing through the pipeline.
    pub is_current: bool,
}

impl Symbol {
    pub fn variable(parameter_name: &str, var_name: &str, serializer: SerializerRef) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            ast: ast::Expression::var(var_name),
            serializer,
            is_current: false,
        }
    }

    pub fn current(parameter_name: &str, ast: ast::Expression, serializer: SerializerRef) -> Self {
        Self {
            parameter_name: parameter_name.to_string(),
            ast,
            serializer,
            is_current: true,
        }
    }
}

/// The immutable state of a translation. Adding symbols returns a new
/// context; the parent stays valid for sibling sub-expressions.
#[derive(Clone)]
pub struct TranslationContext {
    serializer_registry: Arc<dyn SerializerRegistry>,
    symbols: BTreeMap<ParameterId, Symbol>,
    bound_names: BTreeSet<String>,
    options: TranslationOptions,
}

impl std::fmt::Debug for TranslationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationContext")
            .field("symbols", &self.symbols)
            .field("bound_names", &self.bound_names)
            .field("options", &self.options)
            .finish()
    }
}

impl TranslationContext {
    pub fn new(serializer_registry: Arc<dyn SerializerRegistry>, options: TranslationOptions) -> Self {
        Self {
            serializer_registry,
            symbols: BTreeMap::new(),
            bound_names: BTreeSet::new(),
            options,
        }
    }

    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    pub fn serializer_for(&self, ty: &HostType) -> Result<SerializerRef> {
        Ok(self.serializer_registry.lookup(ty)?)
    }

    pub fn with_symbol(&self, parameter: &ParameterExpression, symbol: Symbol) -> Self {
        self.with_symbols(vec![(parameter, symbol)])
    }

    pub fn with_symbols<'a>(
        &self,
        symbols: impl IntoIterator<Item = (&'a ParameterExpression, Symbol)>,
    ) -> Self {
        let mut context = self.clone();
        for (parameter, symbol) in symbols {
            if let ast::Expression::Variable(name) = &symbol.ast {
                context.bound_names.insert(name.clone());
            }
            context.symbols.insert(parameter.id, symbol);
        }
        context
    }

    /// Reserves a variable introduced by a translator itself, so that user
    /// parameters translated inside its scope get distinct names.
    pub fn with_variable_name(&self, name: &str) -> Self {
        let mut context = self.clone();
        context.bound_names.insert(name.to_string());
        context
    }

    pub fn lookup(&self, parameter: &ParameterExpression) -> Result<&Symbol> {
        self.symbols
            .get(&parameter.id)
            .ok_or_else(|| Error::UnboundParameter(parameter.name.clone()))
    }

    /// A variable name derived from `base` that is legal in MQL (leading
    /// lower-case letter, word characters only) and not bound in this
    /// context.
    pub fn unique_variable_name(&self, base: &str) -> String {
        let sanitized = match &*ILLEGAL_VARIABLE_CHARACTERS {
            Some(re) => re.replace_all(base, "_").to_string(),
            None => base.to_string(),
        };
        let mut chars = sanitized.chars();
        let mut name = match chars.next() {
            Some(c) if c.is_ascii_uppercase() => {
                c.to_ascii_lowercase().to_string() + chars.as_str()
            }
            Some(c) if c.is_ascii_lowercase() || !c.is_ascii() => sanitized.clone(),
            Some(_) => format!("v{sanitized}"),
            None => "v".to_string(),
        };
        if self.is_taken(&name) {
            let mut suffix = 1;
            while self.is_taken(&format!("{name}{suffix}")) {
                suffix += 1;
            }
            name = format!("{name}{suffix}");
        }
        name
    }

    fn is_taken(&self, name: &str) -> bool {
        RESERVED_VARIABLE_NAMES.contains(&name) || self.bound_names.contains(name)
    }

    /// Binds a lambda parameter to a fresh variable and returns the new
    /// context together with the variable name.
    pub fn bind_parameter(
        &self,
        parameter: &ParameterExpression,
        serializer: SerializerRef,
    ) -> (Self, String) {
        let name = self.unique_variable_name(&parameter.name);
        let context = self.with_symbol(
            parameter,
            Symbol::variable(&parameter.name, &name, serializer),
        );
        (context, name)
    }

    pub fn require_server_version(&self, operator: &'static str, required: ServerVersion) -> Result<()> {
        if self.options.compatibility_level < required {
            return Err(Error::RequiresServerVersion {
                operator,
                required,
                configured: self.options.compatibility_level,
            });
        }
        Ok(())
    }
}

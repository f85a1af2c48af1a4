use super::{
    members, methods::MethodTranslatorRegistry, utils, Error, Result, Symbol, TranslationContext,
};
use crate::{
    ast::{self, NaryOperator, UnaryOperator as AstUnaryOperator},
    expression::{
        BinaryExpression, BinaryOperator, Expression, HostType, NewExpression, UnaryExpression,
        UnaryOperator,
    },
    serializer::{ArraySerializer, DocumentSerializer, NullableSerializer, SerializerRef},
};
use linqmql_datastructures::unique_linked_hash_map::UniqueLinkedHashMap;
use std::sync::Arc;

/// The result of translating one host sub-expression: the AST computing
/// its value and the serializer describing that value.
#[derive(Debug, Clone)]
pub struct TranslatedExpression {
    pub expression: Expression,
    pub ast: ast::Expression,
    pub serializer: SerializerRef,
}

/// The recursive-descent dispatcher. Method calls are delegated to the
/// method translators registered in `methods`.
#[derive(Clone)]
pub struct ExpressionTranslator {
    methods: Arc<MethodTranslatorRegistry>,
}

impl Default for ExpressionTranslator {
    fn default() -> Self {
        Self::standard()
    }
}

impl ExpressionTranslator {
    pub fn new(methods: Arc<MethodTranslatorRegistry>) -> Self {
        Self { methods }
    }

    pub fn standard() -> Self {
        Self::new(Arc::new(MethodTranslatorRegistry::standard()))
    }

    pub fn translate(&self, context: &TranslationContext, expression: &Expression) -> Result<TranslatedExpression> {
        let (ast, serializer) = match expression {
            Expression::Constant(c) => {
                let serializer = context.serializer_for(&c.ty)?;
                let value = serializer.serialize_value(&c.value)?;
                (ast::Expression::constant(value), serializer)
            }
            Expression::Parameter(p) => {
                let symbol = context.lookup(p)?;
                (symbol.ast.clone(), symbol.serializer.clone())
            }
            Expression::MemberAccess(m) => return members::translate_member(self, context, m),
            Expression::MethodCall(call) => return self.methods.translate(self, context, call),
            Expression::Binary(b) => self.translate_binary(context, b)?,
            Expression::Unary(u) => self.translate_unary(context, u)?,
            Expression::Conditional(c) => {
                let test = self.translate(context, &c.test)?;
                let if_true = self.translate(context, &c.if_true)?;
                let if_false = self.translate(context, &c.if_false)?;
                (
                    ast::Expression::cond(test.ast, if_true.ast, if_false.ast),
                    if_true.serializer,
                )
            }
            Expression::NewArray(a) => {
                let item_serializer = context.serializer_for(&a.element_type)?;
                let items = a
                    .elements
                    .iter()
                    .map(|e| utils::translate_comparand(self, context, e, &item_serializer))
                    .collect::<Result<Vec<_>>>()?;
                let serializer: SerializerRef =
                    Arc::new(ArraySerializer::new(expression.ty(), item_serializer));
                (ast::Expression::Array(items), serializer)
            }
            Expression::New(n) => self.translate_new(context, n)?,
            Expression::Lambda(_) => {
                return Err(Error::not_supported_because(
                    expression,
                    "Lambda expressions can only be used as method arguments.",
                ))
            }
            Expression::Queryable(_) => return Err(Error::NotQueryable(expression.to_string())),
        };
        Ok(TranslatedExpression {
            expression: expression.clone(),
            ast,
            serializer,
        })
    }

    /// Translates the body of a lambda argument, binding each parameter to
    /// a fresh variable with the given serializer. Returns the variable
    /// names in parameter order.
    pub fn translate_lambda(
        &self,
        context: &TranslationContext,
        lambda: &Expression,
        serializers: &[SerializerRef],
    ) -> Result<(Vec<String>, TranslatedExpression)> {
        let l = lambda.as_lambda().ok_or_else(|| Error::not_supported(lambda))?;
        if l.parameters.len() != serializers.len() {
            return Err(Error::not_supported(lambda));
        }
        let mut inner = context.clone();
        let mut names = Vec::with_capacity(serializers.len());
        for (parameter, serializer) in l.parameters.iter().zip(serializers) {
            let (next, name) = inner.bind_parameter(parameter, serializer.clone());
            inner = next;
            names.push(name);
        }
        Ok((names, self.translate(&inner, &l.body)?))
    }

    /// Translates the body of a lambda argument with each parameter bound
    /// to an existing AST, such as `$$this` inside `$reduce`.
    pub fn translate_lambda_with(
        &self,
        context: &TranslationContext,
        lambda: &Expression,
        bindings: Vec<(ast::Expression, SerializerRef)>,
    ) -> Result<TranslatedExpression> {
        let l = lambda.as_lambda().ok_or_else(|| Error::not_supported(lambda))?;
        if l.parameters.len() != bindings.len() {
            return Err(Error::not_supported(lambda));
        }
        let inner = context.with_symbols(l.parameters.iter().zip(bindings).map(
            |(parameter, (ast, serializer))| {
                (
                    parameter,
                    Symbol {
                        parameter_name: parameter.name.clone(),
                        ast,
                        serializer,
                        is_current: false,
                    },
                )
            },
        ));
        self.translate(&inner, &l.body)
    }

    fn translate_binary(
        &self,
        context: &TranslationContext,
        b: &BinaryExpression,
    ) -> Result<(ast::Expression, SerializerRef)> {
        use BinaryOperator::*;
        let boolean = || context.serializer_for(&HostType::Boolean);
        Ok(match b.op {
            AndAlso | OrElse | And | Or if b.ty.underlying_type() == &HostType::Boolean => {
                let left = self.translate(context, &b.left)?.ast;
                let right = self.translate(context, &b.right)?.ast;
                let ast = if matches!(b.op, AndAlso | And) {
                    ast::Expression::and(vec![left, right])
                } else {
                    ast::Expression::or(vec![left, right])
                };
                (ast, boolean()?)
            }
            Equal | NotEqual | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
                let (left, right) = utils::translate_comparands(self, context, &b.left, &b.right)?;
                let op = match b.op {
                    Equal => ast::BinaryOperator::Eq,
                    NotEqual => ast::BinaryOperator::Ne,
                    LessThan => ast::BinaryOperator::Lt,
                    LessThanOrEqual => ast::BinaryOperator::Lte,
                    GreaterThan => ast::BinaryOperator::Gt,
                    _ => ast::BinaryOperator::Gte,
                };
                (ast::Expression::binary(op, left.ast, right), boolean()?)
            }
            Add if b.left.ty() == HostType::String || b.right.ty() == HostType::String => {
                let left = self.translate_concat_operand(context, &b.left)?;
                let right = self.translate_concat_operand(context, &b.right)?;
                (
                    ast::Expression::concat(vec![left, right]),
                    context.serializer_for(&HostType::String)?,
                )
            }
            Add | Subtract | Multiply | Divide | Modulo | Power => {
                let left = self.translate(context, &b.left)?.ast;
                let right = self.translate(context, &b.right)?.ast;
                let ast = match b.op {
                    Add => ast::Expression::add(vec![left, right]),
                    Subtract => ast::Expression::subtract(left, right),
                    Multiply => ast::Expression::nary(NaryOperator::Multiply, vec![left, right]),
                    Divide if b.left.ty().is_integral() && b.right.ty().is_integral() => {
                        ast::Expression::unary(
                            AstUnaryOperator::Trunc,
                            ast::Expression::binary(ast::BinaryOperator::Divide, left, right),
                        )
                    }
                    Divide => ast::Expression::binary(ast::BinaryOperator::Divide, left, right),
                    Modulo => ast::Expression::binary(ast::BinaryOperator::Mod, left, right),
                    _ => ast::Expression::binary(ast::BinaryOperator::Pow, left, right),
                };
                (ast, context.serializer_for(&b.ty)?)
            }
            Coalesce => {
                let left = self.translate(context, &b.left)?;
                let right = self.translate(context, &b.right)?;
                (ast::Expression::if_null(left.ast, right.ast), right.serializer)
            }
            ArrayIndex => {
                let array = self.translate(context, &b.left)?;
                let index = self.translate(context, &b.right)?;
                (
                    ast::Expression::array_elem_at(array.ast, index.ast),
                    array.serializer.item_serializer()?,
                )
            }
            _ => return Err(Error::not_supported(Expression::Binary(b.clone()))),
        })
    }

    /// Non-string operands of a string `+` are converted with `$toString`.
    fn translate_concat_operand(&self, context: &TranslationContext, operand: &Expression) -> Result<ast::Expression> {
        let translated = self.translate(context, operand)?;
        Ok(match operand.ty() {
            HostType::String => translated.ast,
            _ => ast::Expression::unary(AstUnaryOperator::ToString, translated.ast),
        })
    }

    fn translate_unary(
        &self,
        context: &TranslationContext,
        u: &UnaryExpression,
    ) -> Result<(ast::Expression, SerializerRef)> {
        Ok(match u.op {
            UnaryOperator::Quote => {
                let operand = self.translate(context, &u.operand)?;
                (operand.ast, operand.serializer)
            }
            UnaryOperator::Not => {
                let operand = self.translate(context, &u.operand)?;
                (ast::Expression::not(operand.ast), operand.serializer)
            }
            UnaryOperator::Negate => {
                let operand = self.translate(context, &u.operand)?;
                (
                    ast::Expression::subtract(ast::Expression::constant(0), operand.ast),
                    operand.serializer,
                )
            }
            UnaryOperator::ArrayLength => {
                let operand = self.translate(context, &u.operand)?;
                (
                    ast::Expression::size(operand.ast),
                    context.serializer_for(&HostType::Int32)?,
                )
            }
            UnaryOperator::Convert => self.translate_convert(context, u)?,
        })
    }

    /// Casts. Boxing and nullable wrapping keep the value unchanged;
    /// numeric casts convert on the server.
    fn translate_convert(
        &self,
        context: &TranslationContext,
        u: &UnaryExpression,
    ) -> Result<(ast::Expression, SerializerRef)> {
        let operand = self.translate(context, &u.operand)?;
        let source = u.operand.ty();
        let target = &u.ty;
        if &source == target || target == &HostType::Object {
            return Ok((operand.ast, operand.serializer));
        }
        if source.underlying_type() == target.underlying_type() {
            let serializer: SerializerRef = if target.is_nullable() {
                Arc::new(NullableSerializer::new(operand.serializer))
            } else {
                context.serializer_for(target)?
            };
            return Ok((operand.ast, serializer));
        }
        let numeric_source = source.is_numeric() || source.underlying_type() == &HostType::Char;
        if numeric_source && target.is_numeric() {
            return Ok((
                utils::convert_numeric(operand.ast, &source, target),
                context.serializer_for(target)?,
            ));
        }
        Err(Error::not_supported(Expression::Unary(u.clone())))
    }

    /// `new { A = a }` builds an anonymous document; `new T { A = a }`
    /// stores each member under the element name of T's class map.
    fn translate_new(
        &self,
        context: &TranslationContext,
        n: &NewExpression,
    ) -> Result<(ast::Expression, SerializerRef)> {
        let mut fields = UniqueLinkedHashMap::new();
        let serializer: SerializerRef = match &n.ty {
            HostType::Anonymous(_) => {
                let mut members = Vec::with_capacity(n.members.len());
                for (name, e) in n.members.iter() {
                    validate_document_key(name)?;
                    let member = self.translate(context, e)?;
                    fields.insert(name.clone(), member.ast)?;
                    members.push((name.clone(), member.serializer));
                }
                Arc::new(DocumentSerializer::anonymous(members))
            }
            ty => {
                let serializer = context.serializer_for(ty)?;
                for (name, e) in n.members.iter() {
                    let member = serializer.member(name)?;
                    validate_document_key(&member.element_name)?;
                    let value = utils::translate_comparand(self, context, e, &member.serializer)?;
                    fields.insert(member.element_name, value)?;
                }
                serializer
            }
        };
        Ok((ast::Expression::document(fields), serializer))
    }
}

pub(crate) fn validate_document_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains('.') || key.starts_with('$') {
        return Err(Error::InvalidDocumentKey(key.to_string()));
    }
    Ok(())
}

use crate::ast::{
    self, AccumulatorOperator, BinaryOperator, ComparisonOperator, ConvertTarget, DateUnit,
    Expression, FieldOperation, Filter, IndexOfOperator, NaryOperator, SortDirection, Stage,
    TernaryOperator, TrimOperator, UnaryOperator,
};
use bson::{bson, doc, Bson, Document};
use linqmql_datastructures::unique_linked_hash_map::DuplicateKeyError;
use thiserror::Error;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("field paths must have at least one segment")]
    EmptyFieldPath,
    #[error("invalid field name '{0}': field names may not be empty, contain dots, or start with dollars")]
    InvalidFieldName(String),
    #[error("duplicate key found: {0}")]
    DuplicateKey(#[from] DuplicateKeyError),
}

/// Renders the AST into BSON. Rendering is a pure tree transformation; the
/// only failures are malformed nodes.
#[derive(Clone, Debug, Default)]
pub struct MqlCodeGenerator {}

impl MqlCodeGenerator {
    fn unary_op(op: UnaryOperator) -> &'static str {
        use UnaryOperator::*;
        match op {
            Abs => "$abs",
            AllElementsTrue => "$allElementsTrue",
            AnyElementTrue => "$anyElementTrue",
            ArrayToObject => "$arrayToObject",
            Avg => "$avg",
            Ceil => "$ceil",
            DayOfMonth => "$dayOfMonth",
            DayOfWeek => "$dayOfWeek",
            DayOfYear => "$dayOfYear",
            Exp => "$exp",
            First => "$first",
            Floor => "$floor",
            Hour => "$hour",
            IsArray => "$isArray",
            Last => "$last",
            Ln => "$ln",
            Log10 => "$log10",
            Max => "$max",
            Millisecond => "$millisecond",
            Min => "$min",
            Minute => "$minute",
            Month => "$month",
            Not => "$not",
            ObjectToArray => "$objectToArray",
            ReverseArray => "$reverseArray",
            Second => "$second",
            Size => "$size",
            Sqrt => "$sqrt",
            StdDevPop => "$stdDevPop",
            StdDevSamp => "$stdDevSamp",
            StrLenBytes => "$strLenBytes",
            StrLenCP => "$strLenCP",
            Sum => "$sum",
            ToBool => "$toBool",
            ToDate => "$toDate",
            ToDecimal => "$toDecimal",
            ToDouble => "$toDouble",
            ToInt => "$toInt",
            ToLong => "$toLong",
            ToLower => "$toLower",
            ToObjectId => "$toObjectId",
            ToString => "$toString",
            ToUpper => "$toUpper",
            Trunc => "$trunc",
            Type => "$type",
            Year => "$year",
        }
    }

    fn binary_op(op: BinaryOperator) -> &'static str {
        use BinaryOperator::*;
        match op {
            ArrayElemAt => "$arrayElemAt",
            Cmp => "$cmp",
            Divide => "$divide",
            Eq => "$eq",
            Gt => "$gt",
            Gte => "$gte",
            IfNull => "$ifNull",
            In => "$in",
            Log => "$log",
            Lt => "$lt",
            Lte => "$lte",
            Mod => "$mod",
            Ne => "$ne",
            Pow => "$pow",
            Round => "$round",
            SetDifference => "$setDifference",
            SetIsSubset => "$setIsSubset",
            Split => "$split",
            StrCaseCmp => "$strcasecmp",
            Subtract => "$subtract",
        }
    }

    fn ternary_op(op: TernaryOperator) -> &'static str {
        match op {
            TernaryOperator::SubstrBytes => "$substrBytes",
            TernaryOperator::SubstrCP => "$substrCP",
        }
    }

    fn nary_op(op: NaryOperator) -> &'static str {
        use NaryOperator::*;
        match op {
            Add => "$add",
            And => "$and",
            Concat => "$concat",
            ConcatArrays => "$concatArrays",
            Max => "$max",
            Min => "$min",
            Multiply => "$multiply",
            Or => "$or",
            SetIntersection => "$setIntersection",
            SetUnion => "$setUnion",
        }
    }

    fn index_of_op(op: IndexOfOperator) -> &'static str {
        match op {
            IndexOfOperator::Array => "$indexOfArray",
            IndexOfOperator::Bytes => "$indexOfBytes",
            IndexOfOperator::CP => "$indexOfCP",
        }
    }

    fn trim_op(op: TrimOperator) -> &'static str {
        match op {
            TrimOperator::Trim => "$trim",
            TrimOperator::LTrim => "$ltrim",
            TrimOperator::RTrim => "$rtrim",
        }
    }

    fn convert_target(to: ConvertTarget) -> &'static str {
        match to {
            ConvertTarget::Bool => "bool",
            ConvertTarget::Date => "date",
            ConvertTarget::Decimal => "decimal",
            ConvertTarget::Double => "double",
            ConvertTarget::Int => "int",
            ConvertTarget::Long => "long",
            ConvertTarget::ObjectId => "objectId",
            ConvertTarget::String => "string",
        }
    }

    fn date_unit(unit: DateUnit) -> &'static str {
        match unit {
            DateUnit::Year => "year",
            DateUnit::Month => "month",
            DateUnit::Day => "day",
            DateUnit::Hour => "hour",
            DateUnit::Minute => "minute",
            DateUnit::Second => "second",
            DateUnit::Millisecond => "millisecond",
        }
    }

    fn comparison_op(op: ComparisonOperator) -> &'static str {
        match op {
            ComparisonOperator::Eq => "$eq",
            ComparisonOperator::Ne => "$ne",
            ComparisonOperator::Gt => "$gt",
            ComparisonOperator::Gte => "$gte",
            ComparisonOperator::Lt => "$lt",
            ComparisonOperator::Lte => "$lte",
        }
    }

    fn accumulator_op(op: AccumulatorOperator) -> &'static str {
        match op {
            AccumulatorOperator::AddToSet => "$addToSet",
            AccumulatorOperator::Avg => "$avg",
            AccumulatorOperator::First => "$first",
            AccumulatorOperator::Last => "$last",
            AccumulatorOperator::Max => "$max",
            AccumulatorOperator::Min => "$min",
            AccumulatorOperator::Push => "$push",
            AccumulatorOperator::StdDevPop => "$stdDevPop",
            AccumulatorOperator::StdDevSamp => "$stdDevSamp",
            AccumulatorOperator::Sum => "$sum",
        }
    }

    fn validate_field_name(name: &str) -> Result<()> {
        if name.is_empty() || name.contains('.') || name.starts_with('$') {
            return Err(Error::InvalidFieldName(name.to_string()));
        }
        Ok(())
    }

    fn dotted_path(segments: &[String]) -> Result<String> {
        if segments.is_empty() {
            return Err(Error::EmptyFieldPath);
        }
        Ok(segments.join("."))
    }

    /// Renders an expression. Adjacent applications of the same variadic
    /// operator are merged, and a `$let` without bindings renders as its
    /// body.
    pub fn codegen_expression(&self, expr: Expression) -> Result<Bson> {
        Ok(match expr {
            Expression::Constant(value) => value,
            Expression::Literal(value) => bson!({ "$literal": value }),
            Expression::FieldPath(path) => {
                let mut rendered = match path.root {
                    Some(root) => format!("$${root}"),
                    None => format!("${}", Self::dotted_path(&path.segments)?),
                };
                if rendered.starts_with("$$") && !path.segments.is_empty() {
                    rendered = format!("{rendered}.{}", path.segments.join("."));
                }
                Bson::String(rendered)
            }
            Expression::Variable(name) => Bson::String(format!("$${name}")),
            Expression::Unary(u) => {
                let arg = match self.codegen_expression(*u.arg)? {
                    Bson::Array(items) => Bson::Array(vec![Bson::Array(items)]),
                    arg => arg,
                };
                bson!({ Self::unary_op(u.op): arg })
            }
            Expression::Binary(b) => bson!({
                Self::binary_op(b.op): [
                    self.codegen_expression(*b.left)?,
                    self.codegen_expression(*b.right)?,
                ]
            }),
            Expression::Ternary(t) => bson!({
                Self::ternary_op(t.op): [
                    self.codegen_expression(*t.first)?,
                    self.codegen_expression(*t.second)?,
                    self.codegen_expression(*t.third)?,
                ]
            }),
            Expression::Nary(n) => {
                let args = Self::flatten_nary_args(n.op, n.args)
                    .into_iter()
                    .map(|arg| self.codegen_expression(arg))
                    .collect::<Result<Vec<_>>>()?;
                bson!({ Self::nary_op(n.op): args })
            }
            Expression::Cond(c) => bson!({
                "$cond": {
                    "if": self.codegen_expression(*c.if_expr)?,
                    "then": self.codegen_expression(*c.then_expr)?,
                    "else": self.codegen_expression(*c.else_expr)?,
                }
            }),
            Expression::Let(l) if l.vars.is_empty() => self.codegen_expression(*l.inside)?,
            Expression::Let(l) => {
                let mut vars = Document::new();
                for var in l.vars {
                    vars.insert(var.name, self.codegen_expression(*var.value)?);
                }
                bson!({
                    "$let": {
                        "vars": vars,
                        "in": self.codegen_expression(*l.inside)?,
                    }
                })
            }
            Expression::Map(m) => bson!({
                "$map": {
                    "input": self.codegen_expression(*m.input)?,
                    "as": m.as_name,
                    "in": self.codegen_expression(*m.inside)?,
                }
            }),
            Expression::Filter(f) => {
                let mut spec = doc! {
                    "input": self.codegen_expression(*f.input)?,
                    "as": f.as_name,
                    "cond": self.codegen_expression(*f.cond)?,
                };
                if let Some(limit) = f.limit {
                    spec.insert("limit", self.codegen_expression(*limit)?);
                }
                bson!({ "$filter": spec })
            }
            Expression::Reduce(r) => bson!({
                "$reduce": {
                    "input": self.codegen_expression(*r.input)?,
                    "initialValue": self.codegen_expression(*r.initial_value)?,
                    "in": self.codegen_expression(*r.inside)?,
                }
            }),
            Expression::Zip(z) => {
                let inputs = z
                    .inputs
                    .into_iter()
                    .map(|input| self.codegen_expression(input))
                    .collect::<Result<Vec<_>>>()?;
                let mut spec = doc! { "inputs": inputs };
                if z.use_longest_length {
                    spec.insert("useLongestLength", true);
                }
                bson!({ "$zip": spec })
            }
            Expression::Range(r) => {
                let mut args = vec![
                    self.codegen_expression(*r.start)?,
                    self.codegen_expression(*r.end)?,
                ];
                if let Some(step) = r.step {
                    args.push(self.codegen_expression(*step)?);
                }
                bson!({ "$range": args })
            }
            Expression::Slice(s) => {
                let mut args = vec![self.codegen_expression(*s.input)?];
                if let Some(position) = s.position {
                    args.push(self.codegen_expression(*position)?);
                }
                args.push(self.codegen_expression(*s.n)?);
                bson!({ "$slice": args })
            }
            Expression::IndexOf(i) => {
                let mut args = vec![
                    self.codegen_expression(*i.input)?,
                    self.codegen_expression(*i.search)?,
                ];
                if let Some(start) = i.start {
                    args.push(self.codegen_expression(*start)?);
                    if let Some(end) = i.end {
                        args.push(self.codegen_expression(*end)?);
                    }
                }
                bson!({ Self::index_of_op(i.op): args })
            }
            Expression::Convert(c) => {
                let mut spec = doc! {
                    "input": self.codegen_expression(*c.input)?,
                    "to": Self::convert_target(c.to),
                };
                if let Some(on_error) = c.on_error {
                    spec.insert("onError", self.codegen_expression(*on_error)?);
                }
                if let Some(on_null) = c.on_null {
                    spec.insert("onNull", self.codegen_expression(*on_null)?);
                }
                bson!({ "$convert": spec })
            }
            Expression::Switch(s) => {
                let branches = s
                    .branches
                    .into_iter()
                    .map(|b| {
                        Ok(bson!({
                            "case": self.codegen_expression(*b.case)?,
                            "then": self.codegen_expression(*b.then)?,
                        }))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let mut spec = doc! { "branches": branches };
                if let Some(default) = s.default {
                    spec.insert("default", self.codegen_expression(*default)?);
                }
                bson!({ "$switch": spec })
            }
            Expression::Trim(t) => {
                let mut spec = doc! { "input": self.codegen_expression(*t.input)? };
                if let Some(chars) = t.chars {
                    spec.insert("chars", self.codegen_expression(*chars)?);
                }
                bson!({ Self::trim_op(t.op): spec })
            }
            Expression::RegexMatch(r) => {
                let mut spec = doc! {
                    "input": self.codegen_expression(*r.input)?,
                    "regex": r.regex,
                };
                if !r.options.is_empty() {
                    spec.insert("options", r.options);
                }
                bson!({ "$regexMatch": spec })
            }
            Expression::ReplaceAll(r) => bson!({
                "$replaceAll": {
                    "input": self.codegen_expression(*r.input)?,
                    "find": self.codegen_expression(*r.find)?,
                    "replacement": self.codegen_expression(*r.replacement)?,
                }
            }),
            Expression::DateAdd(d) => bson!({
                "$dateAdd": {
                    "startDate": self.codegen_expression(*d.start_date)?,
                    "unit": Self::date_unit(d.unit),
                    "amount": self.codegen_expression(*d.amount)?,
                }
            }),
            Expression::GetField(g) => bson!({
                "$getField": {
                    "field": self.codegen_expression(Expression::constant(g.field))?,
                    "input": self.codegen_expression(*g.input)?,
                }
            }),
            Expression::Array(items) => Bson::Array(
                items
                    .into_iter()
                    .map(|item| self.codegen_expression(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Expression::Document(fields) => {
                let mut out = Document::new();
                for (k, v) in fields {
                    Self::validate_field_name(&k)?;
                    out.insert(k, self.codegen_expression(v)?);
                }
                Bson::Document(out)
            }
        })
    }

    fn flatten_nary_args(op: NaryOperator, args: Vec<Expression>) -> Vec<Expression> {
        args.into_iter()
            .flat_map(|arg| match arg {
                Expression::Nary(inner) if inner.op == op => {
                    Self::flatten_nary_args(op, inner.args)
                }
                arg => vec![arg],
            })
            .collect()
    }

    fn codegen_field_operation(&self, op: FieldOperation) -> Result<Bson> {
        Ok(match op {
            FieldOperation::Comparison(op, value) => bson!({ Self::comparison_op(op): value }),
            FieldOperation::In(values) => bson!({ "$in": values }),
            FieldOperation::Nin(values) => bson!({ "$nin": values }),
            FieldOperation::Exists(b) => bson!({ "$exists": b }),
            FieldOperation::Regex { pattern, options } => {
                let mut spec = doc! { "$regex": pattern };
                if !options.is_empty() {
                    spec.insert("$options", options);
                }
                Bson::Document(spec)
            }
            FieldOperation::ElemMatch(filter) => {
                bson!({ "$elemMatch": self.codegen_elem_match(*filter)? })
            }
            FieldOperation::Size(n) => bson!({ "$size": n }),
            FieldOperation::Not(inner) => bson!({ "$not": self.codegen_field_operation(*inner)? }),
        })
    }

    /// Equality renders as the bare value unless the value would be read
    /// as an operator document.
    fn codegen_field_value(&self, op: FieldOperation) -> Result<Bson> {
        match op {
            FieldOperation::Comparison(ComparisonOperator::Eq, value) => match &value {
                Bson::Document(d) if d.keys().any(|k| k.starts_with('$')) => {
                    Ok(bson!({ "$eq": value }))
                }
                _ => Ok(value),
            },
            op => self.codegen_field_operation(op),
        }
    }

    /// Element filters whose paths are empty apply to the array element
    /// itself and render as bare operator documents.
    fn codegen_elem_match(&self, filter: Filter) -> Result<Document> {
        match filter {
            Filter::Field(f) if f.path.is_empty() => match self.codegen_field_operation(f.op)? {
                Bson::Document(d) => Ok(d),
                other => Ok(doc! { "$eq": other }),
            },
            Filter::And(filters)
                if filters
                    .iter()
                    .all(|f| matches!(f, Filter::Field(ff) if ff.path.is_empty())) =>
            {
                let mut out = Document::new();
                for f in filters {
                    for (k, v) in self.codegen_elem_match(f)? {
                        if out.contains_key(&k) {
                            return Err(Error::DuplicateKey(DuplicateKeyError(k)));
                        }
                        out.insert(k, v);
                    }
                }
                Ok(out)
            }
            filter => self.codegen_filter(filter),
        }
    }

    /// Renders a match-language filter. Conjunctions over distinct plain
    /// field names render as one document; everything else uses `$and`.
    pub fn codegen_filter(&self, filter: Filter) -> Result<Document> {
        Ok(match filter {
            Filter::And(filters) => {
                let rendered = filters
                    .into_iter()
                    .map(|f| self.codegen_filter(f))
                    .collect::<Result<Vec<_>>>()?;
                let total_keys: usize = rendered.iter().map(Document::len).sum();
                let distinct_keys = rendered
                    .iter()
                    .flat_map(|d| d.keys())
                    .collect::<std::collections::BTreeSet<_>>();
                let mergeable = distinct_keys.len() == total_keys
                    && distinct_keys.iter().all(|k| !k.starts_with('$'));
                if mergeable {
                    rendered.into_iter().flatten().collect()
                } else {
                    doc! { "$and": rendered }
                }
            }
            Filter::Or(filters) => doc! {
                "$or": filters
                    .into_iter()
                    .map(|f| self.codegen_filter(f))
                    .collect::<Result<Vec<_>>>()?
            },
            Filter::Nor(filters) => doc! {
                "$nor": filters
                    .into_iter()
                    .map(|f| self.codegen_filter(f))
                    .collect::<Result<Vec<_>>>()?
            },
            Filter::Field(f) => {
                let path = Self::dotted_path(&f.path)?;
                doc! { path: self.codegen_field_value(f.op)? }
            }
            Filter::Expr(e) => doc! { "$expr": self.codegen_expression(e)? },
        })
    }

    /// In `$project`, bare numbers and booleans mean inclusion or
    /// exclusion at any depth of an embedded document, so constants are
    /// always wrapped in `$literal`. An empty embedded document is not a
    /// valid projection either.
    fn codegen_project_value(&self, expr: Expression) -> Result<Bson> {
        match expr {
            Expression::Constant(value) | Expression::Literal(value) => {
                Ok(bson!({ "$literal": value }))
            }
            Expression::Document(fields) if fields.is_empty() => Ok(bson!({ "$literal": {} })),
            Expression::Document(fields) => {
                let mut out = Document::new();
                for (k, v) in fields {
                    Self::validate_field_name(&k)?;
                    out.insert(k, self.codegen_project_value(v)?);
                }
                Ok(Bson::Document(out))
            }
            expr => self.codegen_expression(expr),
        }
    }

    pub fn codegen_stage(&self, stage: Stage) -> Result<Document> {
        Ok(match stage {
            Stage::Match(filter) => doc! { "$match": self.codegen_filter(filter)? },
            Stage::Project(fields) => {
                let mut spec = Document::new();
                if !fields.contains_key(&"_id".to_string()) {
                    spec.insert("_id", 0);
                }
                for (k, v) in fields {
                    Self::validate_field_name(&k)?;
                    spec.insert(k, self.codegen_project_value(v)?);
                }
                doc! { "$project": spec }
            }
            Stage::AddFields(fields) => {
                let mut spec = Document::new();
                for (k, v) in fields {
                    Self::validate_field_name(&k)?;
                    spec.insert(k, self.codegen_expression(v)?);
                }
                doc! { "$addFields": spec }
            }
            Stage::Group(ast::Group { id, accumulators }) => {
                let mut spec = doc! { "_id": self.codegen_expression(id)? };
                for (k, acc) in accumulators {
                    Self::validate_field_name(&k)?;
                    spec.insert(
                        k,
                        bson!({ Self::accumulator_op(acc.op): self.codegen_expression(acc.arg)? }),
                    );
                }
                doc! { "$group": spec }
            }
            Stage::Sort(fields) => {
                let mut spec = Document::new();
                for field in fields {
                    let direction = match field.direction {
                        SortDirection::Ascending => 1,
                        SortDirection::Descending => -1,
                    };
                    spec.insert(Self::dotted_path(&field.path)?, direction);
                }
                doc! { "$sort": spec }
            }
            Stage::Skip(n) => doc! { "$skip": n },
            Stage::Limit(n) => doc! { "$limit": n },
            Stage::ReplaceRoot(e) => doc! { "$replaceRoot": { "newRoot": self.codegen_expression(e)? } },
            Stage::Unwind(path) => doc! { "$unwind": format!("${}", Self::dotted_path(&path)?) },
        })
    }

    pub fn codegen_pipeline(&self, pipeline: ast::Pipeline) -> Result<Vec<Document>> {
        pipeline
            .stages
            .into_iter()
            .map(|stage| self.codegen_stage(stage))
            .collect()
    }
}

use super::definitions::*;

/// A by-value rewriting visitor. Each `visit_*` method defaults to walking
/// the node's children; implementations override the nodes they rewrite
/// and call `walk` to keep recursing.
pub trait Visitor: Sized {
    fn visit_expression(&mut self, node: Expression) -> Expression {
        node.walk(self)
    }

    fn visit_filter(&mut self, node: Filter) -> Filter {
        node.walk(self)
    }

    fn visit_stage(&mut self, node: Stage) -> Stage {
        node.walk(self)
    }

    fn visit_pipeline(&mut self, node: Pipeline) -> Pipeline {
        Pipeline {
            stages: node
                .stages
                .into_iter()
                .map(|s| self.visit_stage(s))
                .collect(),
        }
    }
}

pub trait Walk {
    fn walk<V: Visitor>(self, visitor: &mut V) -> Self;
}

fn visit_box<V: Visitor>(visitor: &mut V, node: Box<Expression>) -> Box<Expression> {
    Box::new(visitor.visit_expression(*node))
}

fn visit_opt<V: Visitor>(visitor: &mut V, node: Option<Box<Expression>>) -> Option<Box<Expression>> {
    node.map(|n| visit_box(visitor, n))
}

fn visit_vec<V: Visitor>(visitor: &mut V, nodes: Vec<Expression>) -> Vec<Expression> {
    nodes
        .into_iter()
        .map(|n| visitor.visit_expression(n))
        .collect()
}

impl Walk for Expression {
    fn walk<V: Visitor>(self, visitor: &mut V) -> Self {
        match self {
            Expression::Constant(_)
            | Expression::Literal(_)
            | Expression::FieldPath(_)
            | Expression::Variable(_) => self,
            Expression::Unary(n) => Expression::Unary(Unary {
                op: n.op,
                arg: visit_box(visitor, n.arg),
            }),
            Expression::Binary(n) => Expression::Binary(Binary {
                op: n.op,
                left: visit_box(visitor, n.left),
                right: visit_box(visitor, n.right),
            }),
            Expression::Ternary(n) => Expression::Ternary(Ternary {
                op: n.op,
                first: visit_box(visitor, n.first),
                second: visit_box(visitor, n.second),
                third: visit_box(visitor, n.third),
            }),
            Expression::Nary(n) => Expression::Nary(Nary {
                op: n.op,
                args: visit_vec(visitor, n.args),
            }),
            Expression::Cond(n) => Expression::Cond(Cond {
                if_expr: visit_box(visitor, n.if_expr),
                then_expr: visit_box(visitor, n.then_expr),
                else_expr: visit_box(visitor, n.else_expr),
            }),
            Expression::Let(n) => Expression::Let(Let {
                vars: n
                    .vars
                    .into_iter()
                    .map(|v| LetVariable {
                        name: v.name,
                        value: visit_box(visitor, v.value),
                    })
                    .collect(),
                inside: visit_box(visitor, n.inside),
            }),
            Expression::Map(n) => Expression::Map(Map {
                input: visit_box(visitor, n.input),
                as_name: n.as_name,
                inside: visit_box(visitor, n.inside),
            }),
            Expression::Filter(n) => Expression::Filter(ArrayFilter {
                input: visit_box(visitor, n.input),
                as_name: n.as_name,
                cond: visit_box(visitor, n.cond),
                limit: visit_opt(visitor, n.limit),
            }),
            Expression::Reduce(n) => Expression::Reduce(Reduce {
                input: visit_box(visitor, n.input),
                initial_value: visit_box(visitor, n.initial_value),
                inside: visit_box(visitor, n.inside),
            }),
            Expression::Zip(n) => Expression::Zip(Zip {
                inputs: visit_vec(visitor, n.inputs),
                use_longest_length: n.use_longest_length,
            }),
            Expression::Range(n) => Expression::Range(Range {
                start: visit_box(visitor, n.start),
                end: visit_box(visitor, n.end),
                step: visit_opt(visitor, n.step),
            }),
            Expression::Slice(n) => Expression::Slice(Slice {
                input: visit_box(visitor, n.input),
                position: visit_opt(visitor, n.position),
                n: visit_box(visitor, n.n),
            }),
            Expression::IndexOf(n) => Expression::IndexOf(IndexOf {
                op: n.op,
                input: visit_box(visitor, n.input),
                search: visit_box(visitor, n.search),
                start: visit_opt(visitor, n.start),
                end: visit_opt(visitor, n.end),
            }),
            Expression::Convert(n) => Expression::Convert(Convert {
                input: visit_box(visitor, n.input),
                to: n.to,
                on_error: visit_opt(visitor, n.on_error),
                on_null: visit_opt(visitor, n.on_null),
            }),
            Expression::Switch(n) => Expression::Switch(Switch {
                branches: n
                    .branches
                    .into_iter()
                    .map(|b| SwitchCase {
                        case: visit_box(visitor, b.case),
                        then: visit_box(visitor, b.then),
                    })
                    .collect(),
                default: visit_opt(visitor, n.default),
            }),
            Expression::Trim(n) => Expression::Trim(Trim {
                op: n.op,
                input: visit_box(visitor, n.input),
                chars: visit_opt(visitor, n.chars),
            }),
            Expression::RegexMatch(n) => Expression::RegexMatch(RegexMatch {
                input: visit_box(visitor, n.input),
                regex: n.regex,
                options: n.options,
            }),
            Expression::ReplaceAll(n) => Expression::ReplaceAll(ReplaceAll {
                input: visit_box(visitor, n.input),
                find: visit_box(visitor, n.find),
                replacement: visit_box(visitor, n.replacement),
            }),
            Expression::DateAdd(n) => Expression::DateAdd(DateAdd {
                start_date: visit_box(visitor, n.start_date),
                unit: n.unit,
                amount: visit_box(visitor, n.amount),
            }),
            Expression::GetField(n) => Expression::GetField(GetField {
                field: n.field,
                input: visit_box(visitor, n.input),
            }),
            Expression::Array(items) => Expression::Array(visit_vec(visitor, items)),
            Expression::Document(fields) => {
                Expression::Document(fields.map_values(|v| visitor.visit_expression(v)))
            }
        }
    }
}

impl Walk for Filter {
    fn walk<V: Visitor>(self, visitor: &mut V) -> Self {
        match self {
            Filter::And(fs) => Filter::And(fs.into_iter().map(|f| visitor.visit_filter(f)).collect()),
            Filter::Or(fs) => Filter::Or(fs.into_iter().map(|f| visitor.visit_filter(f)).collect()),
            Filter::Nor(fs) => Filter::Nor(fs.into_iter().map(|f| visitor.visit_filter(f)).collect()),
            Filter::Field(FieldFilter {
                path,
                op: FieldOperation::ElemMatch(inner),
            }) => Filter::Field(FieldFilter {
                path,
                op: FieldOperation::ElemMatch(Box::new(visitor.visit_filter(*inner))),
            }),
            Filter::Field(f) => Filter::Field(f),
            Filter::Expr(e) => Filter::Expr(visitor.visit_expression(e)),
        }
    }
}

impl Walk for Stage {
    fn walk<V: Visitor>(self, visitor: &mut V) -> Self {
        match self {
            Stage::Match(f) => Stage::Match(visitor.visit_filter(f)),
            Stage::Project(fields) => {
                Stage::Project(fields.map_values(|v| visitor.visit_expression(v)))
            }
            Stage::AddFields(fields) => {
                Stage::AddFields(fields.map_values(|v| visitor.visit_expression(v)))
            }
            Stage::Group(g) => Stage::Group(Group {
                id: visitor.visit_expression(g.id),
                accumulators: g.accumulators.map_values(|a| Accumulator {
                    op: a.op,
                    arg: visitor.visit_expression(a.arg),
                }),
            }),
            Stage::ReplaceRoot(e) => Stage::ReplaceRoot(visitor.visit_expression(e)),
            Stage::Sort(_) | Stage::Skip(_) | Stage::Limit(_) | Stage::Unwind(_) => self,
        }
    }
}

impl Expression {
    /// The direct sub-expressions of this node, in rendering order.
    pub fn children(&self) -> Vec<&Expression> {
        fn opt(e: &Option<Box<Expression>>) -> Option<&Expression> {
            e.as_deref()
        }
        match self {
            Expression::Constant(_)
            | Expression::Literal(_)
            | Expression::FieldPath(_)
            | Expression::Variable(_) => vec![],
            Expression::Unary(n) => vec![&*n.arg],
            Expression::Binary(n) => vec![&*n.left, &*n.right],
            Expression::Ternary(n) => vec![&*n.first, &*n.second, &*n.third],
            Expression::Nary(n) => n.args.iter().collect(),
            Expression::Cond(n) => vec![&*n.if_expr, &*n.then_expr, &*n.else_expr],
            Expression::Let(n) => n
                .vars
                .iter()
                .map(|v| v.value.as_ref())
                .chain(std::iter::once(n.inside.as_ref()))
                .collect(),
            Expression::Map(n) => vec![&*n.input, &*n.inside],
            Expression::Filter(n) => [Some(n.input.as_ref()), Some(n.cond.as_ref()), opt(&n.limit)]
                .into_iter()
                .flatten()
                .collect(),
            Expression::Reduce(n) => vec![&*n.input, &*n.initial_value, &*n.inside],
            Expression::Zip(n) => n.inputs.iter().collect(),
            Expression::Range(n) => [Some(n.start.as_ref()), Some(n.end.as_ref()), opt(&n.step)]
                .into_iter()
                .flatten()
                .collect(),
            Expression::Slice(n) => [Some(n.input.as_ref()), opt(&n.position), Some(n.n.as_ref())]
                .into_iter()
                .flatten()
                .collect(),
            Expression::IndexOf(n) => [
                Some(n.input.as_ref()),
                Some(n.search.as_ref()),
                opt(&n.start),
                opt(&n.end),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Expression::Convert(n) => [Some(n.input.as_ref()), opt(&n.on_error), opt(&n.on_null)]
                .into_iter()
                .flatten()
                .collect(),
            Expression::Switch(n) => n
                .branches
                .iter()
                .flat_map(|b| [b.case.as_ref(), b.then.as_ref()])
                .chain(opt(&n.default))
                .collect(),
            Expression::Trim(n) => [Some(n.input.as_ref()), opt(&n.chars)]
                .into_iter()
                .flatten()
                .collect(),
            Expression::RegexMatch(n) => vec![&*n.input],
            Expression::ReplaceAll(n) => vec![&*n.input, &*n.find, &*n.replacement],
            Expression::DateAdd(n) => vec![&*n.start_date, &*n.amount],
            Expression::GetField(n) => vec![&*n.input],
            Expression::Array(items) => items.iter().collect(),
            Expression::Document(fields) => fields.values().collect(),
        }
    }
}

#![allow(clippy::result_large_err)]

use pest::Parser;
use pest_derive::Parser;

use crate::ast::Expr;
use crate::errors::ParseError;

#[derive(Parser)]
#[grammar = "grammar.pest"]
struct CandidateParser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;

/// Parse candidate-expression source text into an [`Expr`].
///
/// `filename` only labels diagnostics; it is not read.
pub fn parse(source: &str, filename: &str) -> Result<Expr, ParseError> {
    let mut pairs = CandidateParser::parse(Rule::input, source).map_err(|e| {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, p + 1),
            pest::error::InputLocation::Span((s, e)) => (s, e),
        };
        ParseError::syntax(format!("{e}"), start, end, source, filename)
    })?;
    // The grammar guarantees one expression pair under the silent input rule.
    let expr_pair = pairs.next().unwrap();
    parse_expr(expr_pair, source, filename)
}

fn syntax_error_at(pair: &Pair<'_>, message: String, source: &str, filename: &str) -> ParseError {
    let span = pair.as_span();
    ParseError::syntax(message, span.start(), span.end(), source, filename)
}

fn parse_expr(pair: Pair<'_>, source: &str, filename: &str) -> Result<Expr, ParseError> {
    match pair.as_rule() {
        Rule::expr | Rule::not_expr | Rule::unary | Rule::atom => {
            parse_expr(pair.into_inner().next().unwrap(), source, filename)
        }
        Rule::imp_expr => {
            let mut inner = pair.into_inner();
            let lhs = parse_expr(inner.next().unwrap(), source, filename)?;
            match inner.next() {
                Some(_op) => {
                    let rhs = parse_expr(inner.next().unwrap(), source, filename)?;
                    Ok(lhs.implies(rhs))
                }
                None => Ok(lhs),
            }
        }
        Rule::or_expr => parse_nary(pair, source, filename, Expr::or),
        Rule::and_expr => parse_nary(pair, source, filename, Expr::and),
        Rule::neg_bool => {
            let mut inner = pair.into_inner();
            let _op = inner.next();
            let child = parse_expr(inner.next().unwrap(), source, filename)?;
            Ok(child.not())
        }
        Rule::cmp_expr => {
            let mut inner = pair.into_inner();
            let lhs = parse_expr(inner.next().unwrap(), source, filename)?;
            match inner.next() {
                Some(op) => {
                    let rhs = parse_expr(inner.next().unwrap(), source, filename)?;
                    match op.as_str() {
                        "==" => Ok(lhs.eq(rhs)),
                        "!=" => Ok(lhs.ne(rhs)),
                        "<=" => Ok(lhs.le(rhs)),
                        ">=" => Ok(lhs.ge(rhs)),
                        "<" => Ok(lhs.lt(rhs)),
                        ">" => Ok(lhs.gt(rhs)),
                        other => Err(syntax_error_at(
                            &op,
                            format!("unknown comparison operator '{other}'"),
                            source,
                            filename,
                        )),
                    }
                }
                None => Ok(lhs),
            }
        }
        Rule::add_expr | Rule::mul_expr => {
            let mut inner = pair.into_inner();
            let mut acc = parse_expr(inner.next().unwrap(), source, filename)?;
            while let Some(op) = inner.next() {
                let rhs = parse_expr(inner.next().unwrap(), source, filename)?;
                acc = match op.as_str() {
                    "+" => acc.add(rhs),
                    "-" => acc.sub(rhs),
                    "*" => acc.mul(rhs),
                    other => {
                        return Err(syntax_error_at(
                            &op,
                            format!("unknown arithmetic operator '{other}'"),
                            source,
                            filename,
                        ))
                    }
                };
            }
            Ok(acc)
        }
        Rule::neg_int => {
            let child = parse_expr(pair.into_inner().next().unwrap(), source, filename)?;
            Ok(match child {
                Expr::IntLit(n) => Expr::IntLit(-n),
                other => Expr::int(0).sub(other),
            })
        }
        Rule::bool_lit => Ok(Expr::bool(pair.as_str() == "true")),
        Rule::int_lit => {
            pair.as_str()
                .parse::<i64>()
                .map(Expr::int)
                .map_err(|_| {
                    let span = pair.as_span();
                    ParseError::IntLiteral {
                        text: pair.as_str().to_owned(),
                        span: (span.start(), span.end() - span.start()).into(),
                        src: miette::NamedSource::new(filename, source.to_owned()),
                    }
                })
        }
        Rule::ident => Ok(Expr::var(pair.as_str())),
        other => Err(syntax_error_at(
            &pair,
            format!("unexpected rule {other:?}"),
            source,
            filename,
        )),
    }
}

fn parse_nary(
    pair: Pair<'_>,
    source: &str,
    filename: &str,
    ctor: fn(Vec<Expr>) -> Expr,
) -> Result<Expr, ParseError> {
    let mut operands = Vec::new();
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::or_op | Rule::and_op => {}
            _ => operands.push(parse_expr(p, source, filename)?),
        }
    }
    if operands.len() == 1 {
        Ok(operands.pop().unwrap())
    } else {
        Ok(ctor(operands))
    }
}

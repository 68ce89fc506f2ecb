//! Expensive or non-deterministic work inside member resolvers.
//!
//! Resolvers run once per mapped object, so I/O, blocking waits and repeated
//! enumeration inside them multiply with the size of the mapped graph. The
//! catalog below is purely syntactic.

use super::{Finding, Rule, RuleContext};
use crate::descriptors::EXPENSIVE_OPERATION_IN_RESOLVER;
use mapcheck_types::symbols::simple_name;
use mapcheck_types::{Expr, InterpolationPart, LambdaBody, Stmt, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Ordered by priority: when a resolver matches several, the first one is
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExpensiveOperation {
    HttpRequest,
    ServiceCall,
    FileIo,
    SynchronousWait,
    Reflection,
    MultipleEnumeration,
    NestedLinq,
    CurrentTime,
    RandomNumber,
}

impl ExpensiveOperation {
    pub fn label(self) -> &'static str {
        match self {
            ExpensiveOperation::HttpRequest => "HTTP request",
            ExpensiveOperation::ServiceCall => "database/service call",
            ExpensiveOperation::FileIo => "file I/O",
            ExpensiveOperation::SynchronousWait => "synchronous wait",
            ExpensiveOperation::Reflection => "reflection",
            ExpensiveOperation::MultipleEnumeration => "multiple enumeration",
            ExpensiveOperation::NestedLinq => "nested LINQ",
            ExpensiveOperation::CurrentTime => "current time read",
            ExpensiveOperation::RandomNumber => "random number generation",
        }
    }
}

impl fmt::Display for ExpensiveOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const SERVICE_SUFFIXES: &[&str] = &[
    "Service",
    "Repository",
    "Client",
    "Context",
    "Provider",
    "Manager",
    "Gateway",
    "Api",
];

const HTTP_METHODS: &[&str] = &[
    "GetAsync",
    "PostAsync",
    "PutAsync",
    "DeleteAsync",
    "PatchAsync",
    "SendAsync",
    "GetStringAsync",
    "GetByteArrayAsync",
    "GetStreamAsync",
];

const REFLECTION_METHODS: &[&str] = &[
    "GetType",
    "GetProperty",
    "GetProperties",
    "GetMethod",
    "GetMethods",
    "GetField",
    "GetFields",
    "GetCustomAttributes",
    "InvokeMember",
];

const LINQ_METHODS: &[&str] = &[
    "Select",
    "SelectMany",
    "Where",
    "OrderBy",
    "OrderByDescending",
    "ThenBy",
    "ThenByDescending",
    "GroupBy",
    "Join",
    "Any",
    "All",
    "Count",
    "LongCount",
    "Sum",
    "Average",
    "Min",
    "Max",
    "First",
    "FirstOrDefault",
    "Last",
    "LastOrDefault",
    "Single",
    "SingleOrDefault",
    "Distinct",
    "Aggregate",
    "Contains",
    "Take",
    "Skip",
    "ToList",
    "ToArray",
    "ToDictionary",
    "ToHashSet",
];

pub struct ExpensiveResolverRule;

impl Rule for ExpensiveResolverRule {
    fn id(&self) -> &'static str {
        EXPENSIVE_OPERATION_IN_RESOLVER.id
    }

    fn check(&self, cx: &RuleContext<'_>, out: &mut Vec<Finding>) {
        let scanner = Scanner {
            fields: profile_fields(cx),
            suffixes: SERVICE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .chain(
                    cx.settings
                        .service_suffixes
                        .iter()
                        .filter(|suffix| !suffix.trim().is_empty())
                        .cloned(),
                )
                .collect(),
            max_linq_nesting: cx.settings.max_linq_nesting as usize,
        };
        for (member, member_override) in &cx.config().overrides {
            let found = member_override
                .resolvers
                .iter()
                .filter_map(|resolver| scanner.scan(resolver))
                .min();
            if let Some(operation) = found {
                tracing::debug!(
                    target: "mapcheck.automapper",
                    member = %member,
                    operation = %operation,
                    "expensive resolver"
                );
                out.push(Finding::for_member(
                    &EXPENSIVE_OPERATION_IN_RESOLVER,
                    member.clone(),
                    vec![member.clone(), operation.label().to_string()],
                ));
            }
        }
    }
}

/// Field name -> declared type name, for the profile the declaration lives in
/// and its base classes.
fn profile_fields(cx: &RuleContext<'_>) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut current: Option<TypeId> = cx.declaration.receiver_type;
    let mut depth = 0;
    while let Some(ty) = current {
        let Some(def) = cx.env.type_def(ty) else {
            break;
        };
        for member in &def.members {
            fields
                .entry(member.name.clone())
                .or_insert_with(|| cx.env.display(member.ty.id));
        }
        current = def.base;
        depth += 1;
        if depth > 32 {
            break;
        }
    }
    fields
}

struct Scanner {
    fields: HashMap<String, String>,
    suffixes: Vec<String>,
    max_linq_nesting: usize,
}

impl Scanner {
    /// Highest-priority operation in one resolver lambda.
    fn scan(&self, resolver: &Expr) -> Option<ExpensiveOperation> {
        let (params, body) = resolver.as_lambda()?;
        let param = params.first().map(String::as_str).unwrap_or_default();

        let mut found = BTreeSet::new();
        body.walk(&mut |expr| {
            if let Some(operation) = self.classify(expr) {
                found.insert(operation);
            }
        });
        if enumerates_twice(param, body) {
            found.insert(ExpensiveOperation::MultipleEnumeration);
        }
        if body_linq_depth(body) > self.max_linq_nesting {
            found.insert(ExpensiveOperation::NestedLinq);
        }
        found.into_iter().next()
    }

    fn classify(&self, expr: &Expr) -> Option<ExpensiveOperation> {
        match expr {
            Expr::Call {
                receiver, method, ..
            } => {
                let method = method.as_str();
                if HTTP_METHODS.contains(&method) {
                    return Some(ExpensiveOperation::HttpRequest);
                }
                let receiver_name = receiver.as_deref().and_then(field_name);
                if let Some(name) = receiver_name {
                    if let Some(operation) = self.classify_receiver(name, method) {
                        return Some(operation);
                    }
                }
                match method {
                    "Wait" | "GetResult" => Some(ExpensiveOperation::SynchronousWait),
                    m if REFLECTION_METHODS.contains(&m) => Some(ExpensiveOperation::Reflection),
                    _ => None,
                }
            }
            Expr::Member { receiver, name, .. } => match (receiver.as_ref(), name.as_str()) {
                (Expr::Call { .. }, "Result") => Some(ExpensiveOperation::SynchronousWait),
                (Expr::Name(ty), "Now" | "UtcNow" | "Today")
                    if matches!(ty.as_str(), "DateTime" | "DateTimeOffset") =>
                {
                    Some(ExpensiveOperation::CurrentTime)
                }
                (Expr::Name(ty), "Shared") if ty == "Random" => {
                    Some(ExpensiveOperation::RandomNumber)
                }
                (Expr::TypeOf(_), _) => Some(ExpensiveOperation::Reflection),
                _ => None,
            },
            Expr::New { type_name, .. } => match simple_name(type_name) {
                "HttpClient" => Some(ExpensiveOperation::HttpRequest),
                "StreamReader" | "StreamWriter" | "FileStream" => Some(ExpensiveOperation::FileIo),
                "Random" => Some(ExpensiveOperation::RandomNumber),
                _ => None,
            },
            _ => None,
        }
    }

    /// Calls on a named receiver: static helpers by type name, injected
    /// fields by name or declared type.
    fn classify_receiver(&self, name: &str, method: &str) -> Option<ExpensiveOperation> {
        match (name, method) {
            ("File" | "Directory", _) => return Some(ExpensiveOperation::FileIo),
            ("Activator", "CreateInstance") => return Some(ExpensiveOperation::Reflection),
            ("Guid", "NewGuid") => return Some(ExpensiveOperation::RandomNumber),
            _ => {}
        }
        let field_type = self.fields.get(name).map(|ty| simple_name(ty));
        if field_type.is_some_and(|ty| ty.contains("HttpClient")) {
            return Some(ExpensiveOperation::HttpRequest);
        }
        let injected = name.starts_with('_')
            || self.has_service_suffix(name)
            || field_type.is_some_and(|ty| self.has_service_suffix(ty));
        injected.then_some(ExpensiveOperation::ServiceCall)
    }

    fn has_service_suffix(&self, name: &str) -> bool {
        self.suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_str()))
    }
}

/// `name` and `this.name`.
fn field_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Name(name) => Some(name),
        Expr::Member { receiver, name, .. } if matches!(receiver.as_ref(), Expr::Name(n) if n == "this") => {
            Some(name)
        }
        _ => None,
    }
}

fn is_linq(method: &str) -> bool {
    LINQ_METHODS.contains(&method)
}

/// Two or more LINQ chains starting at the same `src.Member`.
fn enumerates_twice(param: &str, body: &LambdaBody) -> bool {
    let mut chains: HashMap<String, usize> = HashMap::new();
    body.walk(&mut |expr| {
        let Expr::Call {
            receiver: Some(receiver),
            method,
            ..
        } = expr
        else {
            return;
        };
        if !is_linq(method) {
            return;
        }
        if let Some(member) = receiver.as_member_read(param) {
            *chains.entry(member.to_string()).or_default() += 1;
        }
    });
    chains.values().any(|count| *count >= 2)
}

fn body_linq_depth(body: &LambdaBody) -> usize {
    match body {
        LambdaBody::Expr(expr) => linq_depth(expr),
        LambdaBody::Block(stmts) => stmts.iter().map(stmt_linq_depth).max().unwrap_or(0),
    }
}

fn stmt_linq_depth(stmt: &Stmt) -> usize {
    match stmt {
        Stmt::Expr(expr) | Stmt::Return(Some(expr)) | Stmt::Throw(Some(expr)) => linq_depth(expr),
        Stmt::Local {
            init: Some(expr), ..
        } => linq_depth(expr),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => then_branch
            .iter()
            .chain(else_branch)
            .map(stmt_linq_depth)
            .max()
            .unwrap_or(0)
            .max(linq_depth(condition)),
        _ => 0,
    }
}

/// Nesting depth of LINQ calls: a chain counts once, a LINQ call inside a
/// LINQ call's lambda adds a level.
fn linq_depth(expr: &Expr) -> usize {
    match expr {
        Expr::Call {
            receiver,
            method,
            args,
            ..
        } => {
            let receiver_depth = receiver.as_deref().map(linq_depth).unwrap_or(0);
            let args_depth = args.iter().map(linq_depth).max().unwrap_or(0);
            if is_linq(method) {
                receiver_depth.max(1 + args_depth)
            } else {
                receiver_depth.max(args_depth)
            }
        }
        Expr::Lambda { body, .. } => body_linq_depth(body),
        Expr::Member { receiver, .. } => linq_depth(receiver),
        Expr::Unary { operand, .. } => linq_depth(operand),
        Expr::Binary { lhs, rhs, .. } => linq_depth(lhs).max(linq_depth(rhs)),
        Expr::Conditional {
            condition,
            when_true,
            when_false,
        } => linq_depth(condition)
            .max(linq_depth(when_true))
            .max(linq_depth(when_false)),
        Expr::Interpolated(parts) => parts
            .iter()
            .filter_map(|part| match part {
                InterpolationPart::Hole(expr) => Some(linq_depth(expr)),
                InterpolationPart::Text(_) => None,
            })
            .max()
            .unwrap_or(0),
        Expr::New { args, .. } => args.iter().map(linq_depth).max().unwrap_or(0),
        Expr::Cast { expr, .. } | Expr::Await(expr) | Expr::Is { expr, .. } => linq_depth(expr),
        Expr::Name(_) | Expr::Literal(_) | Expr::TypeOf(_) | Expr::Opaque(_) => 0,
    }
}

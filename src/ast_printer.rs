use crate::expr::Expr;
use crate::stmt::Stmt;

/// Converts AST nodes to a fully parenthesized prefix form, e.g.
/// `1 + 2 * 3` → `(+ 1 (* 2 3))`.  Used by the `parse` command and tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // Numbers print without a trailing ".0", strings unquoted.
            Expr::Literal(literal) => literal.to_string(),

            Expr::Grouping(inner) => parenthesize("group", &[inner.as_ref()]),

            Expr::Unary(operator, right) => parenthesize(&operator.lexeme, &[right.as_ref()]),

            Expr::Binary(left, operator, right) | Expr::Logical(left, operator, right) => {
                parenthesize(&operator.lexeme, &[left.as_ref(), right.as_ref()])
            }

            Expr::Variable(name) => name.lexeme.clone(),

            Expr::Assign(name, value) => format!("(= {} {})", name.lexeme, Self::print(value)),

            Expr::Call(callee, _, arguments) => {
                let mut s = format!("(call {}", Self::print(callee));
                for argument in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(argument));
                }
                s.push(')');
                s
            }
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var(name, None) => format!("(var {})", name.lexeme),

            Stmt::Var(name, Some(initializer)) => {
                format!("(var {} {})", name.lexeme, Self::print(initializer))
            }

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                push_stmts(&mut s, statements);
                s.push(')');
                s
            }

            Stmt::If(condition, then_branch, else_branch) => {
                let mut s = format!(
                    "(if {} {}",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                );
                if let Some(else_branch) = else_branch {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(else_branch));
                }
                s.push(')');
                s
            }

            Stmt::While(condition, body) => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(declaration) => {
                let params: Vec<&str> = declaration
                    .params
                    .iter()
                    .map(|p| p.lexeme.as_str())
                    .collect();

                let mut s = format!("(fun {} ({})", declaration.name.lexeme, params.join(" "));
                push_stmts(&mut s, &declaration.body);
                s.push(')');
                s
            }

            Stmt::Return(_, None) => "(return)".into(),

            Stmt::Return(_, Some(value)) => format!("(return {})", Self::print(value)),
        }
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut s = format!("({}", name);

    for expr in exprs {
        s.push(' ');
        s.push_str(&AstPrinter::print(expr));
    }

    s.push(')');
    s
}

fn push_stmts(s: &mut String, statements: &[Stmt]) {
    for stmt in statements {
        s.push(' ');
        s.push_str(&AstPrinter::print_stmt(stmt));
    }
}

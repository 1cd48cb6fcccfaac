#[cfg(test)]
mod interpreter_tests {
    use rox::interpreter::{Interpreter, MAX_CALL_DEPTH};
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::Lox;

    struct Run {
        stdout: String,
        stderr: String,
        had_error: bool,
        had_runtime_error: bool,
    }

    fn run(source: &str) -> Run {
        let mut lox = Lox::with_writers(Vec::new(), Vec::new());
        lox.run(source).expect("writing to a Vec can't fail");

        Run {
            stdout: String::from_utf8_lossy(lox.output()).into_owned(),
            stderr: String::from_utf8_lossy(lox.diagnostics()).into_owned(),
            had_error: lox.had_error(),
            had_runtime_error: lox.had_runtime_error(),
        }
    }

    fn output(source: &str) -> String {
        let result = run(source);
        assert!(!result.had_error, "syntax error: {}", result.stderr);
        assert!(!result.had_runtime_error, "runtime error: {}", result.stdout);
        result.stdout
    }

    fn runtime_error(source: &str) -> Run {
        let result = run(source);
        assert!(!result.had_error, "syntax error: {}", result.stderr);
        assert!(result.had_runtime_error, "expected a runtime error");
        assert_eq!(result.stderr, "", "runtime errors belong on the output stream");
        result
    }

    #[test]
    fn test_for_loop_counts() {
        assert_eq!(
            output("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_addition_and_concatenation() {
        assert_eq!(output("print \"a\" + \"b\";"), "ab\n");
        assert_eq!(output("print 1 + 2;"), "3\n");
    }

    #[test]
    fn test_mixed_addition_is_runtime_error() {
        let result = runtime_error("print 1 + \"2\";");

        assert_eq!(
            result.stdout,
            "Operands must be two numbers or two strings.\n[line 1]\n"
        );
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(
            output("print 3.0; print 3.5; print 10 / 4; print -0.5; print 1000000;"),
            "3\n3.5\n2.5\n-0.5\n1000000\n"
        );
    }

    #[test]
    fn test_negative_zero_keeps_its_sign() {
        assert_eq!(output("print -0; print 0 * -1; print 0;"), "-0\n-0\n0\n");
    }

    #[test]
    fn test_arithmetic_and_comparison() {
        assert_eq!(
            output("print 2 * 3 - 4 / 2; print 1 < 2; print 2 <= 1; print 3 > 3; print 3 >= 3;"),
            "4\ntrue\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_comparison_requires_numbers() {
        let result = runtime_error("print \"a\" < \"b\";");

        assert_eq!(result.stdout, "Operands must be numbers.\n[line 1]\n");
    }

    #[test]
    fn test_unary_minus_requires_number() {
        let result = runtime_error("\n\nprint -\"x\";");

        assert_eq!(result.stdout, "Operand must be a number.\n[line 3]\n");
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output("print !nil; print !false; print !0; print !\"\"; print !!true;"),
            "true\ntrue\nfalse\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_shadowing() {
        assert_eq!(
            output("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        assert_eq!(
            output("var a = 1; { a = 2; { a = a + 1; } } print a;"),
            "3\n"
        );
    }

    #[test]
    fn test_assignment_is_an_expression() {
        assert_eq!(output("var a; var b; a = b = 5; print a; print b;"), "5\n5\n");
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(output("var a = 1; var a = \"two\"; print a;"), "two\n");
    }

    #[test]
    fn test_block_locals_do_not_leak() {
        let result = runtime_error("{ var inner = 1; } print inner;");

        assert_eq!(result.stdout, "Undefined variable 'inner'.\n[line 1]\n");
    }

    #[test]
    fn test_assign_to_undefined_is_error() {
        let result = runtime_error("x = 1;");

        assert_eq!(result.stdout, "Undefined variable 'x'.\n[line 1]\n");
    }

    #[test]
    fn test_uninitialized_var_is_nil() {
        assert_eq!(output("var a; print a;"), "nil\n");
    }

    #[test]
    fn test_functions() {
        assert_eq!(
            output("fun add(a, b) { return a + b; } print add(2, 3);"),
            "5\n"
        );
    }

    #[test]
    fn test_wrong_arity() {
        let result = runtime_error("fun add(a, b) { return a + b; }\nprint add(1);");

        assert_eq!(result.stdout, "Expected 2 arguments but got 1.\n[line 2]\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(
            output("fun f() { var x = 1; } print f(); fun g() { return; } print g();"),
            "nil\nnil\n"
        );
    }

    #[test]
    fn test_return_unwinds_loops_and_blocks() {
        let source = "
            fun first_over(limit) {
                for (var i = 0; ; i = i + 1) {
                    {
                        if (i * i > limit) return i;
                    }
                }
            }
            print first_over(10);
        ";

        assert_eq!(output(source), "4\n");
    }

    #[test]
    fn test_recursion() {
        let source = "
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        ";

        assert_eq!(output(source), "610\n");
    }

    #[test]
    fn test_function_values_print_and_compare() {
        assert_eq!(
            output("fun f() {} var g = f; print f; print f == g; print clock;"),
            "<fn f>\ntrue\n<native fn>\n"
        );
    }

    #[test]
    fn test_calling_non_function() {
        let result = runtime_error("var x = \"str\";\nx();");

        assert_eq!(
            result.stdout,
            "Can only call functions and classes.\n[line 2]\n"
        );
    }

    #[test]
    fn test_arguments_evaluated_left_to_right() {
        let source = "
            var log = \"\";
            fun note(s) { log = log + s; return s; }
            fun three(a, b, c) { return a + b + c; }
            print three(note(\"a\"), note(\"b\"), note(\"c\"));
            print log;
        ";

        assert_eq!(output(source), "abc\nabc\n");
    }

    #[test]
    fn test_functions_capture_globals_only() {
        // Nested functions are enclosed by the global scope, so they see
        // globals but not the locals of the function around them.
        let source = "
            var x = \"global\";
            fun outer() {
                var x = \"local\";
                fun inner() { print x; }
                inner();
            }
            outer();
        ";

        assert_eq!(output(source), "global\n");
    }

    #[test]
    fn test_nested_function_cannot_see_enclosing_locals() {
        let source = "
            fun outer() {
                var hidden = 1;
                fun inner() { return hidden; }
                return inner();
            }
            print outer();
        ";

        let result = runtime_error(source);
        assert_eq!(result.stdout, "Undefined variable 'hidden'.\n[line 4]\n");
    }

    #[test]
    fn test_short_circuit() {
        assert_eq!(output("print false and (1/0);"), "false\n");
        assert_eq!(
            output("print nil or \"fallback\"; print 1 or 2; print 1 and 2; print nil and 2;"),
            "fallback\n1\n2\nnil\n"
        );
    }

    #[test]
    fn test_short_circuit_skips_side_effects() {
        let source = "
            var called = false;
            fun touch() { called = true; return true; }
            var r = true or touch();
            print called;
            r = false and touch();
            print called;
            r = true and touch();
            print called;
        ";

        assert_eq!(output(source), "false\nfalse\ntrue\n");
    }

    #[test]
    fn test_equality() {
        assert_eq!(
            output(
                "print nil == nil; print nil == false; print 1 == 1; print \"a\" == \"a\"; \
                 print 1 == \"1\"; print true != false; print 0 == false;"
            ),
            "true\nfalse\ntrue\ntrue\nfalse\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(output("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
    }

    #[test]
    fn test_if_else_and_while() {
        let source = "
            var i = 0;
            while (i < 5) {
                if (i == 2) print \"two\"; else if (i > 3) print \"big\";
                i = i + 1;
            }
            if (nil) print \"unreachable\";
        ";

        assert_eq!(output(source), "two\nbig\n");
    }

    #[test]
    fn test_runtime_error_keeps_earlier_effects() {
        let result = runtime_error("print 1;\nprint nope;\nprint 2;");

        assert_eq!(result.stdout, "1\nUndefined variable 'nope'.\n[line 2]\n");
    }

    #[test]
    fn test_syntax_error_prevents_execution() {
        let result = run("print 1;\nprint ;\nprint 2;");

        assert!(result.had_error);
        assert!(!result.had_runtime_error);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "[line 2] Error at ';': Expect expression.\n");
    }

    #[test]
    fn test_lex_and_parse_errors_are_all_reported() {
        let result = run("print @;\nprint 1");

        assert!(result.had_error);
        assert_eq!(
            result.stderr,
            "[line 1] Error: Unexpected character.\n\
             [line 1] Error at ';': Expect expression.\n\
             [line 2] Error at end: Expect ';' after value.\n"
        );
    }

    #[test]
    fn test_session_keeps_globals_and_recovers_scope() {
        let mut lox = Lox::with_writers(Vec::new(), Vec::new());

        lox.run("var counter = 1;").unwrap();
        lox.run("{ var local = 1; counter = counter + local; print nope; }")
            .unwrap();
        assert!(lox.had_runtime_error());

        lox.reset_errors();
        lox.run("print counter; print local;").unwrap();

        assert!(lox.had_runtime_error());
        assert_eq!(
            String::from_utf8_lossy(lox.output()),
            "Undefined variable 'nope'.\n[line 1]\n\
             2\n\
             Undefined variable 'local'.\n[line 1]\n"
        );
        assert!(lox.diagnostics().is_empty());
    }

    #[test]
    fn test_clock_is_a_number() {
        assert_eq!(output("print clock() > 0;"), "true\n");

        let result = runtime_error("clock(1);");
        assert_eq!(result.stdout, "Expected 0 arguments but got 1.\n[line 1]\n");
    }

    #[test]
    fn test_unbounded_recursion_is_reported() {
        let result = runtime_error("fun forever(n) { return forever(n + 1); } forever(0);");

        assert_eq!(result.stdout, "Stack overflow.\n[line 1]\n");
    }

    const SUM: &str = "
        fun sum(n) {
            if (n == 0) return 0;
            return n + sum(n - 1);
        }
    ";

    #[test]
    fn test_deep_recursion_on_default_thread_stack() {
        assert_eq!(output(&format!("{SUM} print sum(190);")), "18145\n");
        assert_eq!(output(&format!("{SUM} print sum(1000);")), "500500\n");
    }

    #[test]
    fn test_recursion_up_to_call_depth_limit() {
        let at_limit = format!("{SUM} print sum({});", MAX_CALL_DEPTH - 1);
        let expected = (MAX_CALL_DEPTH - 1) * MAX_CALL_DEPTH / 2;
        assert_eq!(output(&at_limit), format!("{expected}\n"));

        let past_limit = runtime_error(&format!("{SUM} print sum({});", MAX_CALL_DEPTH));
        assert_eq!(past_limit.stdout, "Stack overflow.\n[line 4]\n");
    }

    #[test]
    fn test_interpreter_api_directly() {
        let (tokens, _) = Scanner::new("var a = 2; print a * a;").scan_tokens();
        let statements = Parser::new(&tokens).parse().expect("parses");

        let mut interpreter = Interpreter::with_output(Vec::new());
        interpreter.interpret(&statements).expect("runs");

        assert_eq!(interpreter.into_output(), b"4\n");
    }
}

use super::{callable_ident, make_safe_ident, RustGenerator};
use crate::compiler::*;
use crate::runtime::{displayed, displayed_range, EXPECTED_DIFFERENT};
use proc_macro2::{Ident, TokenStream};
use quote::quote;

impl<'g> RustGenerator<'g> {
    /// Generate the function matching a rule
    ///
    /// It declares `val` and every variable the rule captures, evaluates the rule's body and returns
    /// `val` on success.
    pub(super) fn gen_rule(&mut self, id: RuleId) -> Result<TokenStream, CompileError> {
        let rule = self.grammar.rule(id);
        let callable = callable_ident(rule)?;

        let vars = rule_variables(rule.body())
            .iter()
            .map(|var| make_safe_ident(var))
            .collect::<Vec<_>>();

        let body = self.gen_expr(rule.body())?;

        let doc = match rule.annotation() {
            Some(annotation) => format!(" Rule `{}` ({})", rule.name(), annotation),
            None => format!(" Rule `{}`", rule.name()),
        };

        Ok(quote! {
            #[doc = #doc]
            #[allow(unused_mut, unused_variables, unused_assignments, unused_braces, unused_parens, clippy::all)]
            fn #callable(yy_context: &mut Context<'_>) -> Option<Value> {
                let mut val = Value::Nil;
                #(let mut #vars = Value::Nil;)*

                let yy_result = #body;
                yy_result.map(|_| val)
            }
        })
    }

    /// Generate an expression evaluating to `Option<Value>`, `None` meaning a failed match
    ///
    /// Failing matchers leave the cursor where they started.
    fn gen_expr(&mut self, expr: &Expr) -> Result<TokenStream, CompileError> {
        let tokens = match expr {
            Expr::Literal(text) => {
                let shown = displayed(text);
                quote! { yy_context.string(#text, #shown) }
            }

            Expr::CharRange(from, to) => {
                let shown = displayed_range(*from, *to);
                quote! { yy_context.char_range(#from, #to, #shown) }
            }

            Expr::AnyChar => quote! { yy_context.any_char() },

            Expr::StartAnchor => quote! { yy_context.begin() },

            Expr::EndAnchor => quote! { yy_context.end() },

            Expr::PositionMark => quote! { Some(Value::Pos(yy_context.pos())) },

            Expr::PositionRestore(var) => {
                let var = make_safe_ident(var);

                quote! {{
                    if let Value::Pos(yy_pos) = &#var {
                        yy_context.set_pos(*yy_pos);
                    }

                    Some(Value::Nil)
                }}
            }

            Expr::Call(rule_ref) => {
                let target = rule_ref.target().ok_or_else(|| {
                    CompileError::new(
                        rule_ref.pos(),
                        CompileErrorContent::UnresolvedPlaceholder(format!(
                            "call to rule {}",
                            rule_ref.name()
                        )),
                    )
                })?;

                let callable = callable_ident(self.grammar.rule(target))?;
                quote! { #callable(yy_context) }
            }

            Expr::Sequence(items) => self.gen_sequence(items)?,

            Expr::Choice(alternatives) => self.gen_choice(alternatives)?,

            Expr::Repeat { kind, inner } => self.gen_repeat(kind, inner)?,

            Expr::Predicate { positive, inner } => self.gen_predicate(*positive, inner)?,

            Expr::SemanticPredicate(id) => {
                let block = self.gen_snippet(*id)?;
                let holds = self.fresh();

                quote! {{
                    let #holds: bool = #block;
                    if #holds { Some(Value::Nil) } else { None }
                }}
            }

            Expr::Capture { mode, var, inner } => {
                let inner = self.gen_expr(inner)?;
                let result = self.fresh();
                let captured = self.fresh();
                let store = gen_store(*mode, var, &captured);

                quote! {{
                    let #result = #inner;

                    if let Some(#captured) = &#result {
                        let #captured = #captured.clone();
                        #store
                    }

                    #result
                }}
            }

            Expr::TextCapture { mode, var, inner } => {
                let inner = self.gen_expr(inner)?;
                let start = self.fresh();
                let result = self.fresh();
                let text = self.fresh();
                let store = gen_store(*mode, var, &text);

                quote! {{
                    let #start = yy_context.pos();
                    let #result = #inner;

                    match #result {
                        Some(_) => {
                            let #text = Value::Str(yy_context.take_since(#start).to_string());
                            let yy_text = #text.clone();
                            #store
                            Some(yy_text)
                        }
                        None => None,
                    }
                }}
            }

            Expr::Action(id) => {
                let block = self.gen_snippet(*id)?;

                quote! {{
                    let _ = #block;
                    Some(Value::Nil)
                }}
            }
        };

        Ok(tokens)
    }

    fn gen_sequence(&mut self, items: &[Expr]) -> Result<TokenStream, CompileError> {
        let start = self.fresh();
        let result = self.fresh();

        let mut matched = quote! { Some(Value::Nil) };

        for item in items.iter().rev() {
            let item = self.gen_expr(item)?;

            matched = quote! {
                if (#item).is_some() { #matched } else { None }
            };
        }

        Ok(quote! {{
            let #start = yy_context.pos();
            let #result = #matched;

            if #result.is_none() {
                yy_context.set_pos(#start);
            }

            #result
        }})
    }

    fn gen_choice(&mut self, alternatives: &[Expr]) -> Result<TokenStream, CompileError> {
        let start = self.fresh();
        let result = self.fresh();

        let mut attempts = vec![];

        for (index, alternative) in alternatives.iter().enumerate() {
            let alternative = self.gen_expr(alternative)?;

            attempts.push(if index == 0 {
                quote! { let mut #result = #alternative; }
            } else {
                quote! {
                    if #result.is_none() {
                        yy_context.set_pos(#start);
                        #result = #alternative;
                    }
                }
            });
        }

        Ok(quote! {{
            let #start = yy_context.pos();
            #(#attempts)*

            if #result.is_none() {
                yy_context.set_pos(#start);
            }

            #result
        }})
    }

    fn gen_repeat(&mut self, kind: &RepeatKind, inner: &Expr) -> Result<TokenStream, CompileError> {
        let inner = self.gen_expr(inner)?;

        if let RepeatKind::Optional = kind {
            let start = self.fresh();
            let result = self.fresh();

            return Ok(quote! {{
                let #start = yy_context.pos();
                let #result = #inner;

                if #result.is_none() {
                    yy_context.set_pos(#start);
                }

                Some(#result.unwrap_or_default())
            }});
        }

        let items = self.fresh();
        let before = self.fresh();
        let item = self.fresh();

        // Lazy repetitions stop as soon as what follows them matches, without consuming it
        let stop = match kind {
            RepeatKind::LazyUntil(lookahead) => {
                let follow = lookahead.follow().ok_or_else(|| {
                    CompileError::new(
                        lookahead.pos(),
                        CompileErrorContent::UnresolvedPlaceholder(
                            "lookahead of \"*?\"".to_string(),
                        ),
                    )
                })?;

                let follow = self.gen_expr(follow)?;
                let found = self.fresh();

                quote! {
                    let #found = (#follow).is_some();
                    yy_context.set_pos(#before);

                    if #found {
                        break;
                    }
                }
            }
            _ => quote! {},
        };

        let result = if let RepeatKind::OneOrMore = kind {
            quote! { if #items.is_empty() { None } else { Some(Value::List(#items)) } }
        } else {
            quote! { Some(Value::List(#items)) }
        };

        Ok(quote! {{
            let mut #items: Vec<Value> = Vec::new();

            loop {
                let #before = yy_context.pos();
                #stop

                let #item = #inner;

                match #item {
                    Some(#item) => {
                        #items.push(#item);

                        if yy_context.pos() == #before {
                            break;
                        }
                    }
                    None => {
                        yy_context.set_pos(#before);
                        break;
                    }
                }
            }

            #result
        }})
    }

    fn gen_predicate(&mut self, positive: bool, inner: &Expr) -> Result<TokenStream, CompileError> {
        let inner = self.gen_expr(inner)?;
        let start = self.fresh();
        let saved = self.fresh();
        let matched = self.fresh();

        let outcome = if positive {
            quote! {
                if #matched { Some(Value::Nil) } else { None }
            }
        } else {
            quote! {
                if #matched {
                    yy_context.expect(#start, #EXPECTED_DIFFERENT);
                    None
                } else {
                    yy_context.restore(#saved);
                    Some(Value::Nil)
                }
            }
        };

        Ok(quote! {{
            let #start = yy_context.pos();
            let #saved = yy_context.snapshot();
            let #matched = (#inner).is_some();
            yy_context.set_pos(#start);
            #outcome
        }})
    }

    /// Re-parse an action or a semantic predicate to splice it as a block
    fn gen_snippet(&self, id: SnippetId) -> Result<syn::Block, CompileError> {
        let snippet = self.grammar.snippet(id);

        parse_rust_block(snippet.code()).map_err(|msg| {
            CompileError::new(snippet.pos(), CompileErrorContent::InvalidActionCode(msg))
        })
    }
}

fn gen_store(mode: CaptureMode, var: &str, value: &Ident) -> TokenStream {
    let var = make_safe_ident(var);

    match mode {
        CaptureMode::Assign => quote! { #var = #value; },
        CaptureMode::Append => quote! { #var.append(#value); },
    }
}

/// List the variables a rule's body captures or restores positions from, except `val`
fn rule_variables(body: &Expr) -> Vec<&str> {
    let mut vars = vec![];

    body.walk(&mut |expr| {
        let var = match expr {
            Expr::Capture { var, .. } | Expr::TextCapture { var, .. } => var,
            Expr::PositionRestore(var) => var,
            _ => return,
        };

        if var != "val" && !vars.contains(&var.as_str()) {
            vars.push(var.as_str());
        }
    });

    vars
}

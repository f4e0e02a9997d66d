use crate::config::EmitterConfig;
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

pub type EmitResult = Result<()>;

#[derive(Debug, Clone)]
pub struct EmitContext {
    pub indent_level: usize,
    pub indent_chars: String,
    pub use_colors: bool,
}

impl EmitContext {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_chars: "    ".to_string(),
            use_colors: false,
        }
    }

    pub fn from_config(config: &EmitterConfig) -> Self {
        Self {
            indent_level: 0,
            indent_chars: config.indent_style.unit(),
            use_colors: config.use_colors,
        }
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    pub fn get_indent(&self) -> String {
        self.indent_chars.repeat(self.indent_level)
    }

    pub fn nested(&self) -> Self {
        let mut ctx = self.clone();
        ctx.indent();
        ctx
    }
}

impl Default for EmitContext {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Emitter {
    type Item;

    fn emit<W: Write>(
        &self,
        item: &Self::Item,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult;

    /// Context a fresh emission starts from.
    fn context(&self) -> EmitContext {
        EmitContext::new()
    }

    fn emit_to_string(&self, item: &Self::Item) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = self.context();
        self.emit(item, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct EmitHelper;

impl EmitHelper {
    pub fn write_line<W: Write>(writer: &mut W, context: &EmitContext, text: &str) -> EmitResult {
        writeln!(writer, "{}{}", context.get_indent(), text)?;
        Ok(())
    }

    pub fn colorize(context: &EmitContext, text: &str, color: &str) -> String {
        if context.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn write_colored_line<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        text: &str,
        color: &str,
    ) -> EmitResult {
        let text = Self::colorize(context, text, color);
        Self::write_line(writer, context, &text)
    }

    pub fn write_comment<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        comment: &str,
    ) -> EmitResult {
        Self::write_colored_line(writer, context, &format!("; {}", comment), "bright black")
    }

    pub fn write_section<W: Write>(
        writer: &mut W,
        context: &EmitContext,
        title: &str,
    ) -> EmitResult {
        writeln!(writer)?;
        Self::write_colored_line(writer, context, &format!("; === {} ===", title), "cyan")?;
        Ok(())
    }

    pub fn write_block<W: Write, F>(
        writer: &mut W,
        context: &mut EmitContext,
        header: &str,
        body: F,
    ) -> EmitResult
    where
        F: FnOnce(&mut W, &mut EmitContext) -> EmitResult,
    {
        Self::write_line(writer, context, &format!("{} {{", header))?;
        body(writer, context)?;
        Self::write_line(writer, context, "}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndentStyle;

    #[test]
    fn test_emit_context_indentation() {
        let mut ctx = EmitContext::new();
        assert_eq!(ctx.get_indent(), "");

        ctx.indent();
        ctx.indent();
        assert_eq!(ctx.get_indent(), "        ");

        ctx.dedent();
        ctx.dedent();
        ctx.dedent();
        assert_eq!(ctx.indent_level, 0);
        assert_eq!(ctx.nested().indent_level, 1);
    }

    #[test]
    fn test_context_from_config() {
        let config = EmitterConfig {
            use_colors: false,
            indent_style: IndentStyle::Tabs,
            ..EmitterConfig::default()
        };
        let ctx = EmitContext::from_config(&config).nested();
        assert_eq!(ctx.get_indent(), "\t");
        assert!(!ctx.use_colors);
    }

    #[test]
    fn test_write_comment_uses_semicolon() {
        let mut buffer = Vec::new();
        let ctx = EmitContext::new();

        EmitHelper::write_comment(&mut buffer, &ctx, "three barriers").unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "; three barriers\n");
    }

    #[test]
    fn test_write_section() {
        let mut buffer = Vec::new();
        let ctx = EmitContext::new();

        EmitHelper::write_section(&mut buffer, &ctx, "copyField").unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "\n; === copyField ===\n");
    }

    #[test]
    fn test_write_block_keeps_body_indent_to_caller() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();

        EmitHelper::write_block(&mut buffer, &mut ctx, "method @m()", |w, c| {
            EmitHelper::write_line(w, &c.nested(), "return")
        })
        .unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "method @m() {\n    return\n}\n");
    }

    #[test]
    fn test_colored_line_keeps_text() {
        let mut buffer = Vec::new();
        let mut ctx = EmitContext::new();
        ctx.use_colors = true;

        EmitHelper::write_colored_line(&mut buffer, &ctx, "strong", "red").unwrap();
        assert!(String::from_utf8(buffer).unwrap().contains("strong"));
    }
}

use crate::core::ExtractionResult;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

pub trait OutputWriter {
    fn write_result(&mut self, result: &ExtractionResult) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_result(&mut self, result: &ExtractionResult) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

/// Plain text grouped by source file, the layout used when the result is
/// pasted into a prompt.
pub struct TextWriter<W: Write> {
    writer: W,
}

impl<W: Write> TextWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_section(
        &mut self,
        title: &str,
        groups: &indexmap::IndexMap<String, Vec<String>>,
    ) -> anyhow::Result<()> {
        writeln!(self.writer, "## {title}")?;
        if groups.is_empty() {
            writeln!(self.writer, "(none)")?;
        }
        for (file, declarations) in groups {
            writeln!(self.writer, "// {file}")?;
            for declaration in declarations {
                writeln!(self.writer, "{declaration}")?;
            }
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for TextWriter<W> {
    fn write_result(&mut self, result: &ExtractionResult) -> anyhow::Result<()> {
        writeln!(self.writer, "## Hole")?;
        writeln!(self.writer, "{}", result.hole)?;
        writeln!(self.writer)?;
        self.write_section("Relevant types", &result.relevant_types)?;
        self.write_section("Relevant headers", &result.relevant_headers)?;
        Ok(())
    }
}

pub fn create_writer<'a, W: Write + 'a>(format: OutputFormat, writer: W) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Text => Box::new(TextWriter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn sample() -> ExtractionResult {
        let mut result = ExtractionResult {
            hole: "Todo[]".to_string(),
            ..Default::default()
        };
        result.relevant_types.insert(
            "/p/prelude.ts".to_string(),
            vec!["type Todo = [string, boolean];".to_string()],
        );
        result
    }

    #[test]
    fn test_text_output() {
        let mut buffer = Vec::new();
        create_writer(OutputFormat::Text, &mut buffer)
            .write_result(&sample())
            .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            indoc! {"
                ## Hole
                Todo[]

                ## Relevant types
                // /p/prelude.ts
                type Todo = [string, boolean];

                ## Relevant headers
                (none)

            "}
        );
    }

    #[test]
    fn test_json_output_round_trips() {
        let mut buffer = Vec::new();
        create_writer(OutputFormat::Json, &mut buffer)
            .write_result(&sample())
            .unwrap();
        let parsed: ExtractionResult = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed, sample());
    }
}

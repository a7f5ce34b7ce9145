use crate::domain::validation::ValidationError;

/// Substitute `%s`, `%d` and `%v` placeholders in order; `%%` is a literal percent sign.
///
/// The argument count must match the placeholder count exactly.
pub fn render(format: &str, args: &[String]) -> Result<String, ValidationError> {
    let expected = placeholder_count(format);
    if expected != args.len() {
        return Err(ValidationError::TemplateArguments {
            expected,
            actual: args.len(),
        });
    }

    let mut out = String::with_capacity(format.len() + args.iter().map(String::len).sum::<usize>());
    let mut args = args.iter();
    let mut chars = format.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('s' | 'd' | 'v') => {
                chars.next();
                if let Some(arg) = args.next() {
                    out.push_str(arg);
                }
            }
            Some('%') => {
                chars.next();
                out.push('%');
            }
            _ => out.push('%'),
        }
    }
    Ok(out)
}

fn placeholder_count(format: &str) -> usize {
    let mut count = 0;
    let mut chars = format.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            continue;
        }
        match chars.peek() {
            Some('s' | 'd' | 'v') => {
                count += 1;
                chars.next();
            }
            Some('%') => {
                chars.next();
            }
            _ => {}
        }
    }
    count
}

/// Freeform marketing text: signature, content, and the opt-out suffix.
pub fn marketing_freeform(sign_name: &str, content: &str) -> String {
    format!("【{sign_name}】{content}。回复TD退订")
}

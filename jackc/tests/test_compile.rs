use jackc::{
    lex::{tokens_to_xml, Keyword, Lexer, TokenKind},
    prelude::*,
};

const SEVEN: &str = include_str!("seven.jack");
const POINT: &str = include_str!("point.jack");
const AVERAGE: &str = include_str!("average.jack");

#[test]
fn test_compile_seven() {
    let vm = compile_str(SEVEN).unwrap();
    assert_eq!(vm, include_str!("seven.vm"));
}

#[test]
fn test_compile_point() {
    let vm = compile_str(POINT).unwrap();
    assert_eq!(vm, include_str!("point.vm"));
}

#[test]
fn test_compile_average() {
    let vm = compile_str(AVERAGE).unwrap();
    assert_eq!(vm, include_str!("average.vm"));
}

#[test]
fn test_compile_stats() {
    let mut buf = Vec::new();
    let stats = compile(POINT, &mut buf, &CompileConf::default()).unwrap();

    assert_eq!(stats.class_name, "Point");
    assert_eq!(stats.subroutines, 5);
    assert_eq!(stats.instructions, include_str!("point.vm").lines().count());
}

#[test]
fn test_engine_from_token_stream() {
    let tokens = TokenStream::from_source(AVERAGE);
    let conf = CompileConf::default();
    let engine = CompilationEngine::new(tokens, VmWriter::new(Vec::new()), &conf);
    let stats = engine.compile_class().unwrap();

    assert_eq!(stats.class_name, "Main");
    assert_eq!(stats.subroutines, 1);
}

#[test]
fn test_syntax_error_message() {
    let source = "class Main {\n    function void main() {\n        do Output.printInt(1 +);\n    }\n}\n";
    let err = compile_str(source).unwrap_err();
    assert_eq!(err.to_string(), "[line 3] error at ')': expected expression");
}

#[test]
fn test_token_xml() {
    let tokens = Lexer::new(POINT).tokenize();
    assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Class));
    assert_eq!(tokens[0].line, 2);

    let xml = tokens_to_xml(&tokens);
    let lines: Vec<&str> = xml.lines().collect();
    assert_eq!(lines.len(), tokens.len() + 2);
    assert_eq!(lines[0], "<tokens>");
    assert_eq!(lines[1], "<keyword>class</keyword>");
    assert_eq!(lines[2], "<identifier>Point</identifier>");
    assert_eq!(lines[3], "<symbol>{</symbol>");
    assert_eq!(lines.last(), Some(&"</tokens>"));
    assert!(!xml.contains("//"));
}

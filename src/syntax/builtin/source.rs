//! Source decorator
//!
//! Most C-like and scripting languages differ only in their keywords,
//! comment syntax and string syntax. [`SourceOptions`] describes those
//! differences and [`source_decorator`] builds the grammar.

use crate::syntax::language::Grammar;
use crate::syntax::rules::{Pattern, PatternRule};
use crate::syntax::tokens::StyleTag;

const FLOW_CONTROL_KEYWORDS: &str = "break,continue,do,else,for,if,return,while";
const C_KEYWORDS: &str = "auto,case,char,const,default,double,enum,extern,float,goto,inline,int,\
    long,register,short,signed,sizeof,static,struct,switch,typedef,union,unsigned,void,volatile";
const COMMON_KEYWORDS: &str = "catch,class,delete,false,import,new,operator,private,protected,\
    public,this,throw,true,try,typeof";
const CPP_KEYWORDS: &str = "alignof,align_union,asm,axiom,bool,concept,concept_map,const_cast,\
    constexpr,decltype,delegate,dynamic_cast,explicit,export,friend,generic,late_check,mutable,\
    namespace,nullptr,property,reinterpret_cast,static_assert,static_cast,template,typeid,\
    typename,using,virtual,where";
const JAVA_KEYWORDS: &str = "abstract,assert,boolean,byte,extends,final,finally,implements,import,\
    instanceof,interface,null,native,package,strictfp,super,synchronized,throws,transient";
const CSHARP_KEYWORDS: &str = "as,base,by,checked,decimal,delegate,descending,dynamic,event,fixed,\
    foreach,from,group,implicit,in,internal,into,is,let,lock,object,out,override,orderby,params,\
    partial,readonly,ref,sbyte,sealed,stackalloc,string,select,uint,ulong,unchecked,unsafe,ushort,\
    var,virtual,where";
const JSCRIPT_KEYWORDS: &str = "debugger,eval,export,function,get,null,set,undefined,var,with,\
    Infinity,NaN";
const COFFEE_KEYWORDS: &str = "all,and,by,catch,class,else,extends,false,finally,for,if,in,is,isnt,\
    loop,new,no,not,null,of,off,on,or,return,super,then,throw,true,try,unless,until,when,while,yes";
const PERL_KEYWORDS: &str = "caller,delete,die,do,dump,elsif,eval,exit,foreach,for,goto,if,import,\
    last,local,my,next,no,our,print,package,redo,require,sub,undef,unless,until,use,wantarray,\
    while,BEGIN,END";
const PYTHON_KEYWORDS: &str = "and,as,assert,class,def,del,elif,except,exec,finally,from,global,\
    import,in,is,lambda,nonlocal,not,or,pass,print,raise,try,with,yield,False,True,None";
const RUBY_KEYWORDS: &str = "alias,and,begin,case,class,def,defined,elsif,end,ensure,false,in,\
    module,next,nil,not,or,redo,rescue,retry,self,super,then,true,undef,unless,until,when,yield,\
    BEGIN,END";
const SH_KEYWORDS: &str = "case,done,elif,esac,eval,fi,function,in,local,set,then,until";
const RUST_KEYWORDS: &str = "as,assert,const,copy,drop,enum,extern,fail,false,fn,impl,let,log,\
    loop,match,mod,move,mut,priv,pub,pure,ref,self,static,struct,true,trait,type,unsafe,use";
const PROTO_KEYWORDS: &str = "bytes,default,double,enum,extend,extensions,false,group,import,max,\
    message,option,optional,package,repeated,required,returns,rpc,service,syntax,to,true";

const C_TYPES: &str = r"^(DIR|FILE|vector|(de|priority_)?queue|list|stack|(const_)?iterator|(multi)?(set|map)|bitset|u?(int|float)\d*)\b";
const PROTO_TYPES: &str = r"^(bool|(double|s?fixed|[su]?int)(32|64)|float|string)\b";

/// Tokens after which a `/` starts a regular expression literal
const REGEX_PRECEDER: &str = r"(?:^^\.?|[+-]|[!=]=?=?|#|%=?|&&?=?|\(|\*=?|[+\-]=|->|/=?|::?|<<?=?|>>?>?=?|,|;|\?|@|\[|~|\{|\^\^?=?|\|\|?=?|break|case|continue|delete|do|else|finally|instanceof|return|throw|try|typeof)\s*";

/// How `#` comments are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashComments {
    #[default]
    None,
    /// `#` to end of line
    Line,
    /// `#` to end of line, plus `###` blocks
    Block,
}

/// Which string literal forms are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringStyle {
    /// Single and double quotes, ending at a line break
    #[default]
    SingleLine,
    /// Single, double and back quotes, spanning lines
    MultiLine,
    /// Like `MultiLine` but with `'''` and `"""` forms
    TripleQuoted,
}

/// Whether `/.../` literals are recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegexLiterals {
    #[default]
    None,
    SingleLine,
    MultiLine,
}

/// Knobs for the generic source grammar
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Comma separated keyword lists, joined in order
    pub keywords: Vec<&'static str>,
    pub hash_comments: HashComments,
    /// `//` and `/* */` comments
    pub c_style_comments: bool,
    pub strings: StringStyle,
    /// C# `@"..."` strings
    pub verbatim_strings: bool,
    pub regex_literals: RegexLiterals,
    /// Pattern for type names beyond the capitalized-identifier rule
    pub types: Option<&'static str>,
}

impl SourceOptions {
    fn keyword_pattern(&self) -> Option<String> {
        let words: Vec<&str> = self
            .keywords
            .iter()
            .flat_map(|list| list.split(|c: char| c == ',' || c.is_whitespace()))
            .filter(|word| !word.is_empty())
            .collect();
        (!words.is_empty()).then(|| format!(r"^(?:{})\b", words.join("|")))
    }
}

fn rule(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::new(pattern))
}

fn rule_ci(style: StyleTag, pattern: &str) -> PatternRule {
    PatternRule::new(style, Pattern::case_insensitive(pattern))
}

fn regex_literal(multiline: bool) -> String {
    let (excluded, any) = if multiline { ("", r"[\S\s]") } else { (r"\n\r", ".") };
    // a slash not starting a comment, then raw characters, escapes and
    // non-nesting classes, then the closing slash
    format!(
        r"/(?=[^/*{excluded}])(?:[^/\x5B\x5C{excluded}]|\x5C{any}|\x5B(?:[^\x5C\x5D{excluded}]|\x5C{any})*(?:\x5D|$))+/"
    )
}

/// Build a grammar from `options`
pub fn source_decorator(options: &SourceOptions) -> Grammar {
    let mut grammar = Grammar::new();

    grammar = match options.strings {
        StringStyle::TripleQuoted => grammar.shortcut(
            rule(
                StyleTag::String,
                r#"^(?:'''(?:[^'\\]|\\[\s\S]|'{1,2}(?=[^']))*(?:'''|$)|"""(?:[^"\\]|\\[\s\S]|"{1,2}(?=[^"]))*(?:"""|$)|'(?:[^\\']|\\[\s\S])*(?:'|$)|"(?:[^\\"]|\\[\s\S])*(?:"|$))"#,
            )
            .with_shortcut("'\""),
        ),
        StringStyle::MultiLine => grammar.shortcut(
            rule(
                StyleTag::String,
                r#"^(?:'(?:[^\\']|\\[\s\S])*(?:'|$)|"(?:[^\\"]|\\[\s\S])*(?:"|$)|`(?:[^\\`]|\\[\s\S])*(?:`|$))"#,
            )
            .with_shortcut("'\"`"),
        ),
        StringStyle::SingleLine => grammar.shortcut(
            rule(
                StyleTag::String,
                r#"^(?:'(?:[^\\'\r\n]|\\.)*(?:'|$)|"(?:[^\\"\r\n]|\\.)*(?:"|$))"#,
            )
            .with_shortcut("\"'"),
        ),
    };

    if options.verbatim_strings {
        grammar = grammar.fallback(rule(StyleTag::String, r#"^@"(?:[^"]|"")*(?:"|$)"#));
    }

    match (options.hash_comments, options.c_style_comments) {
        (HashComments::None, _) => {}
        (HashComments::Block, true) => {
            grammar = grammar.shortcut(
                rule(StyleTag::Comment, r"^#(?:##(?:[^#]|#(?!##))*(?:###|$)|.*)")
                    .with_shortcut("#"),
            );
        }
        (HashComments::Line, true) => {
            // preprocessor directives stop before an unclosed comment
            grammar = grammar.shortcut(
                rule(
                    StyleTag::Comment,
                    r"^#(?:(?:define|e(?:l|nd)if|else|error|ifn?def|include|line|pragma|undef|warning)\b|[^\r\n]*)",
                )
                .with_shortcut("#"),
            );
        }
        (_, false) => {
            grammar = grammar.shortcut(rule(StyleTag::Comment, r"^#[^\r\n]*").with_shortcut("#"));
        }
    }
    if options.hash_comments != HashComments::None && options.c_style_comments {
        // #include <stdio.h>
        grammar = grammar.fallback(rule(
            StyleTag::String,
            r"^<(?:(?:(?:\.\./)*|/?)(?:[\w-]+(?:/[\w-]+)+)?[\w-]+\.h(?:h|pp|\+\+)?|[a-z]\w*)>",
        ));
    }

    if options.c_style_comments {
        grammar = grammar
            .fallback(rule(StyleTag::Comment, r"^//[^\r\n]*"))
            .fallback(rule(StyleTag::Comment, r"^/\*[\s\S]*?(?:\*/|$)"));
    }

    if options.regex_literals != RegexLiterals::None {
        let literal = regex_literal(options.regex_literals == RegexLiterals::MultiLine);
        grammar = grammar.fallback(rule(
            StyleTag::embedded("regex"),
            &format!("^{REGEX_PRECEDER}({literal})"),
        ));
    }

    if let Some(types) = options.types {
        grammar = grammar.fallback(rule(StyleTag::Type, types));
    }

    if let Some(keywords) = options.keyword_pattern() {
        grammar = grammar.fallback(rule(StyleTag::Keyword, &keywords));
    }

    let punctuation = if options.regex_literals != RegexLiterals::None {
        r#"^.[^\s\w.$@'"`/\\]*(?!\s*/)"#
    } else {
        r#"^.[^\s\w.$@'"`/\\]*"#
    };

    grammar
        .shortcut(rule(StyleTag::Plain, r"^\s+").with_shortcut(" \r\n\t\u{a0}"))
        .fallback(rule_ci(StyleTag::Literal, r"^@[a-z_$][a-z_$@0-9]*"))
        .fallback(rule(StyleTag::Type, r"^(?:[@_]?[A-Z]+[a-z][A-Za-z_$@0-9]*|\w+_t\b)"))
        .fallback(rule_ci(StyleTag::Plain, r"^[a-z_$][a-z_$@0-9]*"))
        .fallback(
            rule_ci(
                StyleTag::Literal,
                // hex, octal or decimal, maybe with an exponent and a suffix like UL
                r"^(?:0x[a-f0-9]+|(?:\d(?:_\d+)*\d*(?:\.\d*)?|\.\d\+)(?:e[+\-]?\d+)?)[a-z]*",
            )
            .with_shortcut("0123456789"),
        )
        // an escaped quote in shell does not open a string
        .fallback(rule(StyleTag::Plain, r"^\\[\s\S]?"))
        .fallback(rule(StyleTag::Punctuation, punctuation))
}

pub fn default_code() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![
            FLOW_CONTROL_KEYWORDS,
            C_KEYWORDS,
            COMMON_KEYWORDS,
            CPP_KEYWORDS,
            JAVA_KEYWORDS,
            CSHARP_KEYWORDS,
            JSCRIPT_KEYWORDS,
            PERL_KEYWORDS,
            PYTHON_KEYWORDS,
            RUBY_KEYWORDS,
            SH_KEYWORDS,
        ],
        hash_comments: HashComments::Line,
        c_style_comments: true,
        strings: StringStyle::MultiLine,
        regex_literals: RegexLiterals::SingleLine,
        ..Default::default()
    })
}

pub fn c() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, C_KEYWORDS, COMMON_KEYWORDS, CPP_KEYWORDS],
        hash_comments: HashComments::Line,
        c_style_comments: true,
        types: Some(C_TYPES),
        ..Default::default()
    })
}

pub fn json() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec!["null,true,false"],
        ..Default::default()
    })
}

pub fn csharp() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![
            FLOW_CONTROL_KEYWORDS,
            C_KEYWORDS,
            COMMON_KEYWORDS,
            JAVA_KEYWORDS,
            CSHARP_KEYWORDS,
        ],
        hash_comments: HashComments::Line,
        c_style_comments: true,
        verbatim_strings: true,
        types: Some(C_TYPES),
        ..Default::default()
    })
}

pub fn java() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, C_KEYWORDS, COMMON_KEYWORDS, JAVA_KEYWORDS],
        c_style_comments: true,
        ..Default::default()
    })
}

pub fn shell() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, SH_KEYWORDS],
        hash_comments: HashComments::Line,
        strings: StringStyle::MultiLine,
        ..Default::default()
    })
}

pub fn python() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, PYTHON_KEYWORDS],
        hash_comments: HashComments::Line,
        strings: StringStyle::TripleQuoted,
        ..Default::default()
    })
}

pub fn perl() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![PERL_KEYWORDS],
        hash_comments: HashComments::Line,
        strings: StringStyle::MultiLine,
        regex_literals: RegexLiterals::MultiLine,
        ..Default::default()
    })
}

pub fn ruby() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, RUBY_KEYWORDS],
        hash_comments: HashComments::Line,
        strings: StringStyle::MultiLine,
        regex_literals: RegexLiterals::SingleLine,
        ..Default::default()
    })
}

pub fn javascript() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, C_KEYWORDS, COMMON_KEYWORDS, JSCRIPT_KEYWORDS],
        c_style_comments: true,
        regex_literals: RegexLiterals::SingleLine,
        ..Default::default()
    })
}

pub fn coffee() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![COFFEE_KEYWORDS],
        hash_comments: HashComments::Block,
        c_style_comments: true,
        strings: StringStyle::TripleQuoted,
        regex_literals: RegexLiterals::SingleLine,
        ..Default::default()
    })
}

pub fn rust() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![FLOW_CONTROL_KEYWORDS, RUST_KEYWORDS],
        c_style_comments: true,
        ..Default::default()
    })
}

pub fn proto() -> Grammar {
    source_decorator(&SourceOptions {
        keywords: vec![PROTO_KEYWORDS],
        c_style_comments: true,
        types: Some(PROTO_TYPES),
        ..Default::default()
    })
}

/// Body of a regular expression literal
pub fn regex() -> Grammar {
    Grammar::new().fallback(rule(StyleTag::String, r"^[\s\S]+"))
}

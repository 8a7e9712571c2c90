use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fgl_parser::{parse_module, ParseOptions};

// A medium-size module with the common statement and block forms
const MODULE_SOURCE: &str = r#"
IMPORT FGL util.strings
SCHEMA stores

GLOBALS
  DEFINE g_user STRING
  DEFINE g_today DATE
END GLOBALS

TYPE t_item RECORD
  code CHAR(10),
  label VARCHAR(60),
  price DECIMAL(10, 2)
END RECORD

DEFINE m_items DYNAMIC ARRAY OF t_item
CONSTANT c_max = 100

MAIN
  DEFINE i INTEGER
  DEFINE total DECIMAL(12, 2)

  WHENEVER ERROR CALL handle_error
  PREPARE st FROM "select code, label, price from items"
  DECLARE c_items CURSOR FOR st

  LET i = 1
  FOREACH c_items INTO m_items[i].*
    LET i = i + 1
    IF i > c_max THEN
      EXIT FOREACH
    END IF
  END FOREACH

  LET total = 0
  FOR i = 1 TO m_items.getLength()
    LET total = total + m_items[i].price
  END FOR

  MENU "Items"
    COMMAND "Show"
      CALL show_items()
    ON ACTION refresh
      CALL load_items() RETURNING i
    COMMAND "Quit"
      EXIT MENU
  END MENU
END MAIN

FUNCTION show_items()
  DEFINE i INTEGER
  FOR i = 1 TO m_items.getLength()
    CASE
      WHEN m_items[i].price IS NULL
        DISPLAY m_items[i].code CLIPPED, " has no price"
      WHEN m_items[i].price > 1000
        DISPLAY m_items[i].code CLIPPED, " is expensive"
      OTHERWISE
        CONTINUE FOR
    END CASE
  END FOR
END FUNCTION

FUNCTION load_items()
  DEFINE n INTEGER
  TRY
    OPEN c_items
    LET n = 0
    WHILE n < c_max
      FETCH NEXT c_items INTO m_items[n + 1].*
      IF sqlca.sqlcode != 0 THEN
        EXIT WHILE
      END IF
      LET n = n + 1
    END WHILE
    CLOSE c_items
  CATCH
    ERROR "load failed"
  END TRY
  RETURN n
END FUNCTION

FUNCTION handle_error()
  DISPLAY "error ", status
  EXIT PROGRAM 1
END FUNCTION
"#;

fn bench_parse(c: &mut Criterion) {
    let options = ParseOptions::default();
    c.bench_function("parse_module", |b| {
        b.iter(|| parse_module(black_box(MODULE_SOURCE), &options))
    });

    let verbatim = ParseOptions {
        verbatim: true,
        ..ParseOptions::default()
    };
    c.bench_function("parse_module_verbatim", |b| {
        b.iter(|| parse_module(black_box(MODULE_SOURCE), &verbatim))
    });

    // Repeated unterminated blocks exercise recovery.
    let broken = "FUNCTION f()\n  IF x THEN\n    WHILE y\n".repeat(50);
    c.bench_function("parse_module_recovery", |b| {
        b.iter(|| parse_module(black_box(&broken), &options))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);

//! 集成测试共用的输入文件
#![allow(dead_code)]

use rust_xlsxwriter::Workbook;

pub const INVOICE_HEADER: &str =
    "Grupo,Tipo de documento,Folio,Prefijo,Fecha Emisión,NIT Emisor,Nombre Emisor,NIT Receptor,Total,Divisa";

/// 税局导出: 550 严格匹配, 551 宽松匹配, 700 无账簿记录,
/// 另有一张回执和一张开出的发票 (都应被过滤)
pub fn invoices_csv() -> String {
    [
        INVOICE_HEADER,
        "Recibido,Factura electrónica,550,FC,15/01/2024,900123456,Proveedor Uno,800111222,1000,COP",
        "Recibido,Factura electrónica,NC551,FC,16/01/2024,900123456,Proveedor Uno,800111222,1000,COP",
        "Recibido,Factura electrónica,700,FC,17/01/2024,700700700,Proveedor Dos,800111222,300,COP",
        "Recibido,Application response,550,FC,18/01/2024,900123456,Proveedor Uno,800111222,1000,COP",
        "Emitido,Factura electrónica,999,FV,18/01/2024,800111222,ACME SAS,111222333,5,COP",
    ]
    .join("\n")
}

pub const LEDGER_HEADER: &str = "Fecha,Nota,Doc Num,Tercero,Debitos,Creditos";

pub fn ledger_lines() -> Vec<&'static str> {
    vec![
        "2024-01-20,Pago FC-550 enero,D-100,Proveedor Uno Nit: 900123456,600.00,0",
        "2024-01-20,Pago FC-550 enero,D-100,Proveedor Uno Nit: 900123456,400.00,0",
        "2024-01-21,Pago FC-551,D-101,Proveedor Uno Nit: 900123456,950.00,0",
        "2024-01-22,Compra 999,D-102,Otro Nit: 111222333,5.00,0",
    ]
}

/// 明细账: 表头前有 `preamble` 行说明文字
pub fn ledger_csv(preamble: usize) -> String {
    let mut lines: Vec<String> = (0..preamble)
        .map(|i| format!("LIBRO AUXILIAR linea {}", i + 1))
        .collect();
    lines.push(LEDGER_HEADER.to_string());
    lines.extend(ledger_lines().into_iter().map(String::from));
    lines.join("\n")
}

/// 同样的发票数据写成 xlsx, 单号和税号用数字单元格
pub fn invoices_xlsx() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in INVOICE_HEADER.split(',').enumerate() {
        sheet.write_string(0, col as u16, name).unwrap();
    }
    let rows: [(&str, &str, f64, &str, f64, f64); 3] = [
        ("Recibido", "Factura electrónica", 550.0, "15/01/2024", 900123456.0, 1000.0),
        ("Recibido", "Factura electrónica", 551.0, "16/01/2024", 900123456.0, 1000.0),
        ("Recibido", "Factura electrónica", 700.0, "17/01/2024", 700700700.0, 300.0),
    ];
    for (i, (group, kind, folio, date, nit, total)) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, *group).unwrap();
        sheet.write_string(r, 1, *kind).unwrap();
        sheet.write_number(r, 2, *folio).unwrap();
        sheet.write_string(r, 3, "FC").unwrap();
        sheet.write_string(r, 4, *date).unwrap();
        sheet.write_number(r, 5, *nit).unwrap();
        sheet.write_string(r, 6, "Proveedor").unwrap();
        sheet.write_number(r, 7, 800111222.0).unwrap();
        sheet.write_number(r, 8, *total).unwrap();
        sheet.write_string(r, 9, "COP").unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

/// 明细账 xlsx: 三行说明文字, 表头在第 4 行 (下标 3)
pub fn ledger_xlsx() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "LIBRO AUXILIAR").unwrap();
    sheet.write_string(1, 0, "ACME SAS").unwrap();
    sheet.write_string(2, 0, "Enero 2024").unwrap();
    for (col, name) in LEDGER_HEADER.split(',').enumerate() {
        sheet.write_string(3, col as u16, name).unwrap();
    }
    for (i, line) in ledger_lines().iter().enumerate() {
        let r = (i + 4) as u32;
        let fields: Vec<&str> = line.split(',').collect();
        sheet.write_string(r, 0, fields[0]).unwrap();
        sheet.write_string(r, 1, fields[1]).unwrap();
        sheet.write_string(r, 2, fields[2]).unwrap();
        sheet.write_string(r, 3, fields[3]).unwrap();
        sheet.write_number(r, 4, fields[4].parse::<f64>().unwrap()).unwrap();
        sheet.write_number(r, 5, fields[5].parse::<f64>().unwrap()).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}
